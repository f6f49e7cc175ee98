use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_canonical_strings_become_ints() {
    assert_eq!(ArrayKey::from("5"), ArrayKey::Int(5));
    assert_eq!(ArrayKey::from("-12"), ArrayKey::Int(-12));
    assert_eq!(ArrayKey::from("0"), ArrayKey::Int(0));
}

#[test]
fn test_non_canonical_strings_stay_strings() {
    for text in ["05", "-0", "5 ", " 5", "+5", "5.0", "abc", ""] {
        let key = ArrayKey::from(text);
        assert!(
            matches!(&key, ArrayKey::Str(s) if s.as_bytes() == text.as_bytes()),
            "{text:?} keyed as {key:?}"
        );
    }
}

#[test]
fn test_from_str_value_reuses_allocation() {
    let s = StrValue::from("name");
    match ArrayKey::from_str_value(&s) {
        ArrayKey::Str(k) => assert!(StrValue::ptr_eq(&k, &s)),
        ArrayKey::Int(n) => panic!("unexpected int key {n}"),
    }
}

#[test]
fn test_display() {
    assert_eq!(ArrayKey::Int(3).to_string(), "3");
    assert_eq!(ArrayKey::from("k").to_string(), "k");
    assert_eq!(format!("{:?}", ArrayKey::from("k")), "\"k\"");
}

#[allow(
    clippy::disallowed_types,
    reason = "proptest macros internally use Arc"
)]
mod proptest_keys {
    use super::super::ArrayKey;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn int_and_its_string_share_a_key(n in any::<i64>()) {
            prop_assert_eq!(ArrayKey::from(n.to_string().as_str()), ArrayKey::Int(n));
        }

        #[test]
        fn padded_ints_stay_strings(n in any::<i64>()) {
            let text = format!(" {n}");
            prop_assert!(matches!(ArrayKey::from(text.as_str()), ArrayKey::Str(_)));
        }
    }
}
