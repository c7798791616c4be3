//! Derive macros for customer service action enums
//!
//! `#[derive(Action)]` classifies the variants of an action enum into commands
//! and events and generates the helpers the reducers and the runtime rely on.
//!
//! # Example
//!
//! ```ignore
//! use customer_service_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TicketAction {
//!     #[command]
//!     ProcessTicket { ticket_id: String, message: String },
//!
//!     #[event(name = "ticket.message_recorded", version = 2)]
//!     MessageRecorded { ticket_id: String, message: String },
//! }
//!
//! assert!(TicketAction::ProcessTicket { .. }.is_command());
//! assert_eq!(event.event_type(), "ticket.message_recorded.v2");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitInt, LitStr, Meta, parse_macro_input};

/// How a variant was classified
enum Role {
    Command,
    Event { name: String, version: u32 },
    Other,
}

/// Derive macro for Action enums
///
/// Generates:
/// - `is_command()` - true for variants marked `#[command]`
/// - `is_event()` - true for variants marked `#[event]`
/// - `event_type()` - versioned event name, `"unknown"` for non-events
///
/// # Attributes
///
/// - `#[command]`
/// - `#[event]` - named `"<Variant>.v1"`
/// - `#[event(name = "...", version = N)]` - both keys optional
///
/// A variant carrying both `#[command]` and `#[event]` is a compile error.
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_action(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand_action(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "#[derive(Action)] can only be used on enums",
        ));
    };

    let mut command_arms = Vec::new();
    let mut event_arms = Vec::new();
    let mut event_type_arms = Vec::new();

    for variant in &data_enum.variants {
        let pattern = variant_pattern(&variant.ident, &variant.fields);
        match classify(variant)? {
            Role::Command => command_arms.push(quote! { #pattern => true, }),
            Role::Event { name, version } => {
                let type_name = format!("{name}.v{version}");
                event_arms.push(quote! { #pattern => true, });
                event_type_arms.push(quote! { #pattern => #type_name, });
            },
            Role::Other => {},
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Returns true if this action is a command
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is an event
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#event_arms)*
                    _ => false,
                }
            }

            /// Returns the versioned event type name, or `"unknown"` for non-events
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn event_type(&self) -> &'static str {
                match self {
                    #(#event_type_arms)*
                    _ => "unknown",
                }
            }
        }
    })
}

fn classify(variant: &syn::Variant) -> syn::Result<Role> {
    let command = find_attribute(&variant.attrs, "command");
    let event = find_attribute(&variant.attrs, "event");

    match (command, event) {
        (Some(_), Some(_)) => Err(syn::Error::new_spanned(
            variant,
            "Variant cannot be both #[command] and #[event]",
        )),
        (Some(_), None) => Ok(Role::Command),
        (None, Some(attr)) => {
            let mut name = variant.ident.to_string();
            let mut version = 1;

            // Bare `#[event]` has no arguments to parse
            if matches!(attr.meta, Meta::List(_)) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        name = meta.value()?.parse::<LitStr>()?.value();
                        Ok(())
                    } else if meta.path.is_ident("version") {
                        version = meta.value()?.parse::<LitInt>()?.base10_parse()?;
                        Ok(())
                    } else {
                        Err(meta.error("expected `name` or `version`"))
                    }
                })?;
            }

            Ok(Role::Event { name, version })
        },
        (None, None) => Ok(Role::Other),
    }
}

fn variant_pattern(ident: &Ident, fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

fn find_attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}
