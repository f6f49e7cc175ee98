use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_ids_are_unique() {
    let a = ObjectValue::new("Foo");
    let b = ObjectValue::new("Foo");
    assert_ne!(a.object_id(), b.object_id());
    assert!(!ObjectValue::ptr_eq(&a, &b));
}

#[test]
fn test_class_name_and_instance_check() {
    let o = ObjectValue::new("HttpClient");
    assert_eq!(o.class_name(), "HttpClient");
    assert!(o.is_instance_of("httpclient"));
    assert!(o.is_instance_of("HTTPCLIENT"));
    assert!(!o.is_instance_of("Client"));
}

#[test]
fn test_props_are_shared_through_handles() {
    let o = ObjectValue::new("Point");
    let alias = o.clone();
    alias.set_prop("x", Value::Int(3));
    assert_eq!(o.get_prop("x"), Some(Value::Int(3)));
    assert_eq!(o.props().len(), 1);
}

#[test]
fn test_resources() {
    let a = ResourceValue::new("stream");
    let b = ResourceValue::new("stream");
    assert_ne!(a.resource_id(), b.resource_id());
    assert_eq!(a.kind(), "stream");
    assert_eq!(a.to_string(), format!("Resource id #{}", a.resource_id()));
}

#[test]
fn test_language_error_is_exception() {
    let err = language_error("Illegal offset type");
    assert!(err.is_exception());
    let Value::Object(o) = &err else {
        panic!("language error should be an object");
    };
    assert_eq!(o.get_prop("message"), Some(Value::string("Illegal offset type")));
    assert!(!Value::object("Other").is_exception());
}
