//! Proptest generators for property-based testing.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use proptest::prelude::*;

use blindnote_core::{BaseSecret, ContentKind, NoteId, SecretPayload, ViewPolicy, KEY_LEN};

/// Generate a random base secret.
pub fn base_secret() -> impl Strategy<Value = BaseSecret> {
    any::<[u8; KEY_LEN]>().prop_map(BaseSecret::from_bytes)
}

/// Generate a random NoteId.
pub fn note_id() -> impl Strategy<Value = NoteId> {
    any::<[u8; 16]>().prop_map(NoteId::from_bytes)
}

/// Generate a ContentKind.
pub fn content_kind() -> impl Strategy<Value = ContentKind> {
    prop_oneof![
        Just(ContentKind::Password),
        Just(ContentKind::ApiKey),
        Just(ContentKind::Custom),
    ]
}

/// Generate a ViewPolicy, with limits kept small.
pub fn view_policy() -> impl Strategy<Value = ViewPolicy> {
    prop_oneof![
        Just(ViewPolicy::OneTime),
        Just(ViewPolicy::Unlimited),
        (2u32..=16).prop_map(|n| ViewPolicy::Limited(
            NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
        )),
    ]
}

/// Generate a non-empty passphrase.
pub fn passphrase() -> impl Strategy<Value = String> {
    "[ -~]{1,32}".prop_map(String::from)
}

/// Generate an optional passphrase. `Some("")` is included; it means none.
pub fn maybe_passphrase() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        passphrase().prop_map(Some),
    ]
}

/// Generate a field name as it might appear in a credential form.
pub fn field_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,23}".prop_map(String::from)
}

/// Generate a structured payload with up to `max_fields` fields.
pub fn secret_payload(max_fields: usize) -> impl Strategy<Value = SecretPayload> {
    (
        prop::collection::btree_map(field_name(), any::<String>(), 0..=max_fields),
        any::<String>(),
        0i64..=1_700_000_000_000i64,
    )
        .prop_map(|(fields, notes, created_at): (BTreeMap<String, String>, String, i64)| {
            SecretPayload {
                fields,
                notes,
                created_at,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blindnote_core::{open, seal};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_generated_payloads_round_trip(
            payload in secret_payload(6),
            pass in maybe_passphrase(),
        ) {
            let sealed = seal(&payload, pass.as_deref()).unwrap();
            let opened = open(&sealed.wire_blob, &sealed.base_secret, pass.as_deref()).unwrap();
            prop_assert_eq!(opened, payload);
        }

        #[test]
        fn test_generated_ids_survive_hex(id in note_id()) {
            prop_assert_eq!(NoteId::from_hex(&id.to_hex()).unwrap(), id);
        }

        #[test]
        fn test_generated_policies_are_bounded(policy in view_policy()) {
            prop_assert!(policy.allows_view(0));
            prop_assert_eq!(ViewPolicy::from_view_limit(policy.view_limit()), Some(policy));
        }
    }
}
