use syn::{Attribute, Ident, ReturnType, Type, parse_quote};

use crate::utils::{
    ReturnKind, check_param_type, class_name_of, classify_return, exposed_method_name,
    take_method_meta, to_pascal_case,
};

#[test]
fn test_to_pascal_case() {
    assert_eq!(to_pascal_case("return_string"), "ReturnString");
    assert_eq!(to_pascal_case("add"), "Add");
    assert_eq!(to_pascal_case("arg_method"), "ArgMethod");
    assert_eq!(to_pascal_case("get_HTTP_status"), "GetHttpStatus");
}

#[test]
fn test_raw_identifiers_are_unrawed() {
    let ident: Ident = parse_quote!(r#match);
    assert_eq!(exposed_method_name(&ident), "Match");
}

#[test]
fn test_class_name_of() {
    let ty: Type = parse_quote!(Class);
    assert_eq!(class_name_of(&ty).as_deref(), Some("Class"));

    let ty: Type = parse_quote!(crate::api::Calculator);
    assert_eq!(class_name_of(&ty).as_deref(), Some("Calculator"));

    let ty: Type = parse_quote!((u32, u32));
    assert_eq!(class_name_of(&ty), None);
}

#[test]
fn test_classify_return() {
    let output: ReturnType = parse_quote!();
    assert_eq!(classify_return(&output), ReturnKind::Unit);

    let output: ReturnType = parse_quote!(-> ());
    assert_eq!(classify_return(&output), ReturnKind::Unit);

    let output: ReturnType = parse_quote!(-> std::result::Result<u32, String>);
    assert_eq!(classify_return(&output), ReturnKind::Result);

    let output: ReturnType = parse_quote!(-> Vec<String>);
    assert_eq!(classify_return(&output), ReturnKind::Value);
}

#[test]
fn test_check_param_type() {
    assert!(check_param_type(&parse_quote!(String)).is_ok());
    assert!(check_param_type(&parse_quote!(Option<Vec<i64>>)).is_ok());
    assert!(check_param_type(&parse_quote!(&str)).is_err());
    assert!(check_param_type(&parse_quote!(impl Into<String>)).is_err());
}

#[test]
fn test_take_method_meta_strips_rpc_attrs() {
    let mut attrs: Vec<Attribute> = vec![
        parse_quote!(#[doc = "Adds numbers"]),
        parse_quote!(#[rpc(name = "Sum")]),
    ];

    let meta = take_method_meta(&mut attrs).expect("valid attributes");
    assert_eq!(meta.name.as_deref(), Some("Sum"));
    assert!(!meta.skip);
    assert_eq!(attrs.len(), 1);
}

#[test]
fn test_take_method_meta_rejects_unknown_key() {
    let mut attrs: Vec<Attribute> = vec![parse_quote!(#[rpc(alias = "x")])];
    assert!(take_method_meta(&mut attrs).is_err());
}
