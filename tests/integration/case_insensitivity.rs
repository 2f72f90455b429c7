//! Property tests: any casing of a payload key resolves like the canonical key.

use proptest::prelude::*;
use scim_provisioning::normalizer::AttributeNormalizer;
use scim_provisioning::schema::{SchemaRegistry, paths};
use serde_json::{Map, Value, json};

const ENTERPRISE: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// Apply a per-character casing mask to `key`.
fn recase(key: &str, mask: &[bool]) -> String {
    key.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| {
            if *upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

fn object(key: String, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key, value);
    Value::Object(map)
}

proptest! {
    #[test]
    fn simple_attribute_keys_resolve_in_any_casing(
        index in 0usize..6,
        mask in prop::collection::vec(any::<bool>(), 1..16),
        value in "[a-zA-Z0-9@._-]{1,24}",
    ) {
        let keys = [
            ("userName", paths::USER_NAME),
            ("externalId", paths::EXTERNAL_ID),
            ("displayName", paths::DISPLAY_NAME),
            ("locale", paths::LOCALE),
            ("timezone", paths::TIMEZONE),
            ("urn:ietf:params:scim:schemas:core:2.0:User:userName", paths::USER_NAME),
        ];
        let (key, canonical) = keys[index];
        let registry = SchemaRegistry::new().unwrap();
        let normalizer = AttributeNormalizer::new(&registry);

        let expected = normalizer.normalize(&object(key.to_string(), json!(value)));
        let actual = normalizer.normalize(&object(recase(key, &mask), json!(value)));

        prop_assert_eq!(expected.get_str(canonical), Some(value.as_str()));
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn nested_and_extension_keys_resolve_in_any_casing(
        mask in prop::collection::vec(any::<bool>(), 1..16),
        formatted in "[a-zA-Z ]{1,24}[a-zA-Z]",
        manager in "[a-z0-9]{1,12}",
    ) {
        let registry = SchemaRegistry::new().unwrap();
        let normalizer = AttributeNormalizer::new(&registry);

        let payload = object(
            recase("name", &mask),
            object(recase("formatted", &mask), json!(formatted)),
        );
        let attrs = normalizer.normalize(&payload);
        prop_assert_eq!(attrs.get_str(paths::NAME_FORMATTED), Some(formatted.trim()));

        let payload = object(
            recase(ENTERPRISE, &mask),
            object(recase("manager", &mask), json!(manager)),
        );
        let attrs = normalizer.normalize(&payload);
        prop_assert_eq!(attrs.get_str(paths::MANAGER), Some(manager.as_str()));
    }

    #[test]
    fn boolean_strings_coerce_in_any_casing(
        mask in prop::collection::vec(any::<bool>(), 1..8),
        flag in any::<bool>(),
    ) {
        let registry = SchemaRegistry::new().unwrap();
        let normalizer = AttributeNormalizer::new(&registry);
        let raw = recase(&flag.to_string(), &mask);

        let attrs = normalizer.normalize(&object(recase("active", &mask), json!(raw)));
        prop_assert_eq!(attrs.get_bool(paths::ACTIVE), Some(flag));
    }
}
