use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens};
use syn::Type;

/// A field of a generated unit.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    ty: Type,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

impl ToTokens for FieldSpec {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = Ident::new(&self.name, Span::call_site());
        let ty = &self.ty;
        tokens.extend(quote!(#name: #ty,));
    }
}

/// A method of a generated unit.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: String,
    params: Vec<FieldSpec>,
    return_type: Option<Type>,
    body: TokenStream,
    mut_receiver: bool,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, return_type: Option<Type>, body: TokenStream) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type,
            body,
            mut_receiver: false,
        }
    }

    /// A method mutating its unit, used for initialization code.
    pub fn initializer(name: impl Into<String>, body: TokenStream) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
            body,
            mut_receiver: true,
        }
    }

    pub fn with_params(mut self, params: Vec<FieldSpec>) -> Self {
        self.params = params;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.return_type.as_ref()
    }

    pub fn body(&self) -> &TokenStream {
        &self.body
    }
}

impl ToTokens for MethodSpec {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = Ident::new(&self.name, Span::call_site());
        let receiver = if self.mut_receiver {
            quote!(&mut self)
        } else {
            quote!(&self)
        };
        let params = self.params.iter().map(|param| {
            let param_name = Ident::new(param.name(), Span::call_site());
            let param_ty = param.ty();
            quote!(, #param_name: #param_ty)
        });
        let output = self.return_type.as_ref().map(|ty| quote!(-> #ty));
        let body = &self.body;
        tokens.extend(quote! {
            fn #name(#receiver #(#params)*) #output {
                #body
            }
        });
    }
}

/// The assembled structural description of one generated unit.
///
/// This is the hand-off format for the external renderer: an ordered listing
/// of fields, methods and nested units. The [`ToTokens`] implementation is
/// the renderer boundary; nothing in this crate touches source text.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    name: String,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    types: Vec<TypeSpec>,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    pub fn types(&self) -> &[TypeSpec] {
        &self.types
    }

    pub(crate) fn push_field(&mut self, field: FieldSpec) {
        self.fields.push(field);
    }

    pub(crate) fn push_method(&mut self, method: MethodSpec) {
        self.methods.push(method);
    }

    pub(crate) fn push_type(&mut self, nested: TypeSpec) {
        self.types.push(nested);
    }
}

impl ToTokens for TypeSpec {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let name = Ident::new(&self.name, Span::call_site());
        let fields = &self.fields;
        let methods = &self.methods;
        let types = &self.types;
        tokens.extend(quote! {
            struct #name {
                #(#fields)*
            }

            impl #name {
                #(#methods)*
            }

            #(#types)*
        });
    }
}
