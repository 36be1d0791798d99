//! Style selection: annotations, the primitive limit and backend overrides.

use std::sync::Arc;

use graphyaml::{
    DataStyle, Object, ObjectContext, ObjectSerializerBackend, Primitive, Reflect, Serializer,
    SerializerSettings, TypeDescriptor, TypeKey, computed_style,
};
use graphyaml_testhelpers::IPanic;

#[derive(Clone, Debug, Default, PartialEq)]
struct ClassWithStyle {
    name: String,
    value: i32,
}

impl Reflect for ClassWithStyle {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("Name", |c| &c.name, |c| &mut c.name)
            .member("Value", |c| &c.value, |c| &mut c.value)
            .style(DataStyle::Flow)
            .constructible()
            .build()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct CustomList {
    name: String,
    items: Vec<i32>,
}

impl Reflect for CustomList {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("Name", |c| &c.name, |c| &mut c.name)
            .items(|c| &c.items, |c| &mut c.items)
            .style(DataStyle::Flow)
            .constructible()
            .build()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Styles {
    list_with_custom_style: Vec<String>,
    class_with_style: ClassWithStyle,
    class_overridden_by_member: ClassWithStyle,
    dynamic_list: Vec<Object>,
    short_list: Vec<i32>,
    long_list: Vec<i32>,
    list_of_classes: Vec<ClassWithStyle>,
    custom_list: CustomList,
}

impl Reflect for Styles {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member_with(
                "A_ListWithCustomStyle",
                |s| &s.list_with_custom_style,
                |s| &mut s.list_with_custom_style,
                |m| m.style(DataStyle::Flow),
            )
            .member("B_ClassWithStyle", |s| &s.class_with_style, |s| &mut s.class_with_style)
            .member_with(
                "C_ListClassWithStyleOverridenByLocalYamlStyle",
                |s| &s.class_overridden_by_member,
                |s| &mut s.class_overridden_by_member,
                |m| m.style(DataStyle::Block),
            )
            .member("D_ListHandleByDynamicStyleFormat", |s| &s.dynamic_list, |s| &mut s.dynamic_list)
            .member("E_ListDefaultPrimitiveLimit", |s| &s.short_list, |s| &mut s.short_list)
            .member("E_ListDefaultPrimitiveLimitExceed", |s| &s.long_list, |s| &mut s.long_list)
            .member("F_ListClassWithStyleDefaultFormat", |s| &s.list_of_classes, |s| &mut s.list_of_classes)
            .member("G_ListCustom", |s| &s.custom_list, |s| &mut s.custom_list)
            .constructible()
            .build()
    }
}

/// Writes every `Vec<Object>` in flow style, whatever its length.
struct FormatListObject;

impl ObjectSerializerBackend for FormatListObject {
    fn style(&self, cx: &ObjectContext<'_>) -> DataStyle {
        if cx.descriptor.key() == TypeKey::of::<Vec<Object>>() {
            DataStyle::Flow
        } else {
            computed_style(cx)
        }
    }
}

fn styles() -> Styles {
    let class = |name: &str, value: i32| ClassWithStyle {
        name: name.into(),
        value,
    };
    Styles {
        list_with_custom_style: vec!["a".into(), "b".into(), "c".into()],
        class_with_style: class("name1", 1),
        class_overridden_by_member: class("name2", 2),
        dynamic_list: (1..=6).map(|i| Primitive::I32(i).into()).collect(),
        short_list: vec![1, 2],
        long_list: vec![1, 2, 3, 4, 5],
        list_of_classes: vec![class("name3", 3)],
        custom_list: CustomList {
            name: "name4".into(),
            items: (1..=7).collect(),
        },
    }
}

#[graphyaml_testhelpers::test]
fn styles_follow_annotations_limit_and_backend() -> Result<(), IPanic> {
    let mut settings = SerializerSettings::new();
    settings.limit_primitive_flow_sequence = 4;
    settings.backend = Arc::new(FormatListObject);
    let mut serializer = Serializer::with_settings(settings);

    let text = serializer.to_string(&styles())?;
    assert_eq!(
        text,
        "A_ListWithCustomStyle: [a, b, c]
B_ClassWithStyle: {Name: name1, Value: 1}
C_ListClassWithStyleOverridenByLocalYamlStyle:
  Name: name2
  Value: 2
D_ListHandleByDynamicStyleFormat: [1, 2, 3, 4, 5, 6]
E_ListDefaultPrimitiveLimit: [1, 2]
E_ListDefaultPrimitiveLimitExceed:
  - 1
  - 2
  - 3
  - 4
  - 5
F_ListClassWithStyleDefaultFormat:
  - {Name: name3, Value: 3}
G_ListCustom: {Name: name4, ~Items: [1, 2, 3, 4, 5, 6, 7]}
"
    );
    assert_eq!(serializer.from_str::<Styles>(&text)?, styles());
    let reparsed = serializer.from_str::<Styles>(&text)?;
    assert_eq!(serializer.to_string(&reparsed)?, text);
    Ok(())
}

#[graphyaml_testhelpers::test]
fn limit_rule_only_applies_to_scalar_items() -> Result<(), IPanic> {
    let mut serializer = Serializer::with_settings(SerializerSettings {
        limit_primitive_flow_sequence: 10,
        ..SerializerSettings::default()
    });
    let nested = vec![vec![1, 2], vec![3]];
    let text = serializer.to_string(&nested)?;
    assert_eq!(text, "- [1, 2]\n- [3]\n");
    assert_eq!(serializer.from_str::<Vec<Vec<i32>>>(&text)?, nested);
    Ok(())
}

#[graphyaml_testhelpers::test]
fn nested_block_sequences_start_on_their_own_line() -> Result<(), IPanic> {
    let mut serializer = Serializer::new();
    let nested = vec![vec![1, 2], vec![]];
    let text = serializer.to_string(&nested)?;
    assert_eq!(text, "-\n  - 1\n  - 2\n- []\n");
    assert_eq!(serializer.from_str::<Vec<Vec<i32>>>(&text)?, nested);
    Ok(())
}

#[graphyaml_testhelpers::test]
fn mappings_inside_sequences_share_the_dash_line() -> Result<(), IPanic> {
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Entry {
        key: String,
        tags: Vec<String>,
    }

    impl Reflect for Entry {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::object::<Self>()
                .member("Key", |e| &e.key, |e| &mut e.key)
                .member("Tags", |e| &e.tags, |e| &mut e.tags)
                .constructible()
                .build()
        }
    }

    let entries = vec![
        Entry {
            key: "a".into(),
            tags: vec!["x".into(), "y".into()],
        },
        Entry {
            key: "b".into(),
            tags: vec![],
        },
    ];
    let mut serializer = Serializer::new();
    let text = serializer.to_string(&entries)?;
    assert_eq!(text, "- Key: a\n  Tags:\n    - x\n    - y\n- Key: b\n  Tags: []\n");
    assert_eq!(serializer.from_str::<Vec<Entry>>(&text)?, entries);
    Ok(())
}
