//! Property-based tests for xwrap format primitives

use proptest::prelude::*;
use xwrap_format::{
    default_supported_media_types, match_media_type, QuotaKind, ReaderQuotas, TypeDesc, Value,
};

fn type_desc() -> impl Strategy<Value = TypeDesc> {
    let leaf = prop_oneof![
        Just(TypeDesc::Bool),
        Just(TypeDesc::Int),
        Just(TypeDesc::Long),
        Just(TypeDesc::Double),
        Just(TypeDesc::String),
        Just(TypeDesc::ErrorCollection),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(TypeDesc::optional),
            inner.clone().prop_map(TypeDesc::list),
            inner.clone().prop_map(TypeDesc::sequence),
            inner.clone().prop_map(TypeDesc::queryable),
            (inner.clone(), inner).prop_map(|(k, v)| TypeDesc::map(k, v)),
        ]
    })
}

proptest! {
    #[test]
    fn type_display_parses_back(ty in type_desc()) {
        let text = ty.to_string();
        let parsed = TypeDesc::parse(&text).expect("displayed type parses");
        prop_assert_eq!(parsed, ty);
    }

    #[test]
    fn sequence_and_list_share_element_names(ty in type_desc()) {
        prop_assert_eq!(
            TypeDesc::sequence(ty.clone()).element_name(),
            TypeDesc::list(ty.clone()).element_name()
        );
        let seq = TypeDesc::sequence(ty.clone());
        prop_assert_eq!(seq.sequence_element(), Some(&ty));
        prop_assert!(TypeDesc::list(ty).sequence_element().is_none());
    }

    #[test]
    fn only_value_types_default_to_non_null(ty in type_desc()) {
        let default = ty.default_value();
        prop_assert_eq!(ty.is_value_type(), default != Value::Null);
    }

    #[test]
    fn charset_parameters_do_not_affect_matching(
        charset in "[a-z0-9-]{1,12}",
        subtype in prop::sample::select(vec!["xml", "json", "html", "soap+xml"]),
    ) {
        let supported = default_supported_media_types();
        let bare = format!("application/{}", subtype);
        let with_charset = format!("{}; charset={}", bare, charset);
        prop_assert_eq!(
            match_media_type(Some(&bare), &supported).map(|m| m.essence().to_string()),
            match_media_type(Some(&with_charset), &supported).map(|m| m.essence().to_string())
        );
    }

    #[test]
    fn quota_check_is_inclusive(limit in 1usize..10_000, actual in 0usize..20_000) {
        let quotas = ReaderQuotas {
            max_depth: limit,
            ..ReaderQuotas::default()
        };
        prop_assert!(quotas.validate().is_ok());
        let result = quotas.check(QuotaKind::MaxDepth, actual);
        prop_assert_eq!(result.is_ok(), actual <= limit);
    }
}
