use darling::FromDeriveInput;
use darling::FromField;
use proc_macro2::Ident;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::DeriveInput;
use syn::Generics;
use syn::Type;

#[derive(Debug, FromField)]
#[darling(attributes(relorm))]
struct FieldReceiver {
    pub ident: Option<Ident>,
    pub ty:    Type,

    /// Raw tag, e.g. `sql = "pk,columnName=id"`
    #[darling(default)]
    pub sql: Option<String>,

    #[darling(default)]
    pub primary_key: bool,

    #[darling(default)]
    pub read_only: bool,

    #[darling(default)]
    pub column_name: Option<String>,
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(relorm), supports(struct_named))]
struct EntityReceiver {
    pub ident:    Ident,
    pub generics: Generics,
    pub data:     darling::ast::Data<(), FieldReceiver>,

    #[darling(default)]
    pub table_name: Option<String>,
}

#[derive(Debug)]
struct FieldInfo {
    pub field_name: Ident,
    pub ident:      String,
    pub field_type: Type,
    pub tag:        String,
}

#[derive(Debug)]
struct EntityInfo {
    pub struct_name: Ident,
    pub generics:    Generics,
    pub table_name:  Option<String>,
    pub fields:      Vec<FieldInfo>,
}

impl FieldReceiver {
    pub fn to_field_info(self) -> darling::Result<FieldInfo> {
        let field_name = self.ident.ok_or_else(|| darling::Error::custom("Expected named field"))?;
        let ident = field_name.to_string().trim_start_matches("r#").to_string();

        let mut tokens: Vec<String> = self
            .sql
            .iter()
            .flat_map(|sql| sql.split(','))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect();
        if self.primary_key {
            tokens.push("pk".to_string());
        }
        if self.read_only {
            tokens.push("readOnly".to_string());
        }
        if let Some(column_name) = self.column_name {
            tokens.push(format!("columnName={column_name}"));
        }

        Ok(FieldInfo { field_name, ident, field_type: self.ty, tag: tokens.join(",") })
    }
}

impl EntityReceiver {
    pub fn to_entity_info(self) -> darling::Result<EntityInfo> {
        let fields = self
            .data
            .take_struct()
            .ok_or_else(|| darling::Error::unsupported_shape("Expected struct with named fields"))?
            .fields
            .into_iter()
            .map(FieldReceiver::to_field_info)
            .collect::<darling::Result<Vec<_>>>()?;

        Ok(EntityInfo { struct_name: self.ident, generics: self.generics, table_name: self.table_name, fields })
    }
}

/// Derives `relorm::Entity` and `relorm::ScanTarget` for a struct with named fields
///
/// Every field must implement `relorm::IntoValue` and `relorm::FromValue`.
/// Generic parameters are carried over; their bounds must make the struct
/// satisfy `relorm::Entity`'s supertraits.
///
/// ```ignore
/// #[derive(Clone, Debug, Default, Entity)]
/// #[relorm(table_name = "users")]
/// pub struct User {
///     #[relorm(sql = "pk,readOnly")]
///     pub id:    i64,
///     #[relorm(column_name = "email_address")]
///     pub email: String,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(relorm))]
pub fn derive_entity(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    let entity_info = match EntityReceiver::from_derive_input(&input).and_then(EntityReceiver::to_entity_info) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let expanded = impl_entity(&entity_info);
    proc_macro::TokenStream::from(expanded)
}

fn impl_entity(entity_info: &EntityInfo) -> TokenStream2 {
    let name = &entity_info.struct_name;
    let (impl_generics, ty_generics, where_clause) = entity_info.generics.split_for_impl();

    let table_name = match &entity_info.table_name {
        Some(table_name) => quote! { ::std::option::Option::Some(#table_name) },
        None => quote! { ::std::option::Option::None },
    };

    let field_defs: Vec<_> = entity_info
        .fields
        .iter()
        .map(|f| {
            let ident = &f.ident;
            let tag = &f.tag;
            quote! { relorm::FieldDef::new(#ident, #tag) }
        })
        .collect();

    let field_value_arms: Vec<_> = entity_info
        .fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let field_name = &f.field_name;
            quote! {
                #idx => relorm::IntoValue::into_value(::std::clone::Clone::clone(&self.#field_name))
            }
        })
        .collect();

    let set_field_arms: Vec<_> = entity_info
        .fields
        .iter()
        .enumerate()
        .map(|(idx, f)| {
            let field_name = &f.field_name;
            let field_type = &f.field_type;
            quote! {
                #idx => {
                    if let ::std::option::Option::Some(v) = <#field_type as relorm::FromValue>::from_value(value)? {
                        self.#field_name = v;
                    }
                }
            }
        })
        .collect();

    quote! {
        impl #impl_generics relorm::Entity for #name #ty_generics #where_clause {
            fn table_name() -> ::std::option::Option<&'static str> {
                #table_name
            }

            fn field_defs() -> &'static [relorm::FieldDef] {
                const FIELDS: &[relorm::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }

            fn field_value(&self, position: usize) -> relorm::Value {
                match position {
                    #(#field_value_arms,)*
                    _ => relorm::Value::Null,
                }
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                position: usize,
                value: &relorm::Value,
            ) -> ::std::result::Result<(), relorm::CoercionError> {
                match position {
                    #(#set_field_arms)*
                    _ => {}
                }
                ::std::result::Result::Ok(())
            }
        }

        impl #impl_generics relorm::ScanTarget for #name #ty_generics #where_clause {
            type Entity = Self;

            fn shape(&self) -> relorm::Shape {
                relorm::Shape::Struct
            }

            fn records(&self) -> ::std::vec::Vec<&Self> {
                ::std::vec![self]
            }

            fn entity_mut(&mut self) -> ::std::option::Option<&mut Self> {
                ::std::option::Option::Some(self)
            }
        }
    }
}
