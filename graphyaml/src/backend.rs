//! Pluggable naming, filtering and styling hooks.

use std::borrow::Cow;

use graphyaml_core::{DataStyle, MemberDescriptor, Object, TypeKind};

use crate::ObjectContext;

/// Hooks consulted for every object read or written.
///
/// Every method has a default; override only what needs to change and call
/// the free functions of this module to fall back on the default behaviour.
pub trait ObjectSerializerBackend: Send + Sync {
    /// Members written for `cx.instance`, in order.
    fn members<'a>(&self, cx: &ObjectContext<'a>) -> Cow<'a, [MemberDescriptor]> {
        Cow::Borrowed(cx.descriptor.members())
    }

    /// Whether `member` is written with `value`.
    fn should_serialize(&self, cx: &ObjectContext<'_>, member: &MemberDescriptor, value: &Object) -> bool {
        default_should_serialize(cx, member, value)
    }

    /// Style of the node for `cx.instance` when neither the member nor the
    /// type declares one.
    fn style(&self, cx: &ObjectContext<'_>) -> DataStyle {
        computed_style(cx)
    }

    /// Key written for `member`.
    fn write_member_name(&self, _cx: &ObjectContext<'_>, _member: &MemberDescriptor, name: &str) -> String {
        name.to_owned()
    }

    /// Member name a key read from the document refers to; `None` skips the
    /// key and its value.
    fn read_member_name(&self, _cx: &ObjectContext<'_>, name: &str) -> Option<String> {
        Some(name.to_owned())
    }

    /// Entry written for a dictionary item.
    fn write_dictionary_item(&self, _cx: &ObjectContext<'_>, key: Object, value: Object) -> (Object, Object) {
        (key, value)
    }

    /// Entry inserted for a dictionary item read from the document.
    fn read_dictionary_item(&self, _cx: &ObjectContext<'_>, key: Object, value: Object) -> (Object, Object) {
        (key, value)
    }
}

/// The backend with every default.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackend;

impl ObjectSerializerBackend for DefaultBackend {}

/// Drops nulls under `ignore_nulls`, and values equal to the member default
/// unless `emit_default_values` is set.
pub fn default_should_serialize(cx: &ObjectContext<'_>, member: &MemberDescriptor, value: &Object) -> bool {
    if cx.settings.ignore_nulls && value.is_null() {
        return false;
    }
    cx.settings.emit_default_values || !member.is_default(value)
}

/// Flow for short sequences of scalars (see
/// `limit_primitive_flow_sequence`), the configured default otherwise.
pub fn computed_style(cx: &ObjectContext<'_>) -> DataStyle {
    let limit = cx.settings.limit_primitive_flow_sequence;
    let items_only = cx.items || cx.descriptor.members().is_empty();
    if let (TypeKind::Collection(def), Some(instance)) = (cx.descriptor.kind(), cx.instance.as_instance())
        && items_only
        && limit > 0
        && let Ok(items) = def.items(instance)
        && items.len() <= limit
        && items.iter().all(Object::is_scalar)
    {
        return DataStyle::Flow;
    }
    cx.settings.default_style
}
