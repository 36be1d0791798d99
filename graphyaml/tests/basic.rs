//! Writing and reading plain objects: ordering, styles and scalar text.

use graphyaml::{
    DataStyle, Error, Object, Primitive, Reflect, Serializer, SerializerSettings, TypeDescriptor, TypeKey,
    from_str, to_string,
};
use graphyaml_testhelpers::IPanic;

#[derive(Clone, Debug, Default, PartialEq)]
struct MyObject {
    name: String,
    value: String,
    list: Vec<i32>,
}

impl Reflect for MyObject {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("Name", |o| &o.name, |o| &mut o.name)
            .member("Value", |o| &o.value, |o| &mut o.value)
            .member("List", |o| &o.list, |o| &mut o.list)
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn hello_world() -> Result<(), IPanic> {
    let object = MyObject {
        name: "Hello".into(),
        value: "World!".into(),
        list: vec![1, 2, 3],
    };
    let text = to_string(&object)?;
    assert_eq!(text, "List:\n  - 1\n  - 2\n  - 3\nName: Hello\nValue: World!\n");
    assert_eq!(from_str::<MyObject>(&text)?, object);
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Ordered {
    name: String,
    name_after: String,
    before_name: String,
    first: String,
    second: String,
}

impl Reflect for Ordered {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member_with("Second", |o| &o.second, |o| &mut o.second, |m| m.order(1))
            .member_with("First", |o| &o.first, |o| &mut o.first, |m| m.order(0))
            .member("NameAfter", |o| &o.name_after, |o| &mut o.name_after)
            .member("Name", |o| &o.name, |o| &mut o.name)
            .member_with("BeforeName", |o| &o.before_name, |o| &mut o.before_name, |m| m.order(2))
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn explicit_order_then_alphabetical() -> Result<(), IPanic> {
    let object = Ordered {
        name: "n".into(),
        name_after: "na".into(),
        before_name: "bn".into(),
        first: "f".into(),
        second: "s".into(),
    };
    let text = to_string(&object)?;
    assert_eq!(text, "First: f\nSecond: s\nBeforeName: bn\nName: n\nNameAfter: na\n");
    assert_eq!(from_str::<Ordered>(&text)?, object);
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Person {
    name: String,
    value: i32,
    items: Vec<i32>,
}

impl Reflect for Person {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("Name", |p| &p.name, |p| &mut p.name)
            .member("Value", |p| &p.value, |p| &mut p.value)
            .member("Items", |p| &p.items, |p| &mut p.items)
            .constructible()
            .build()
    }
}

fn john() -> Person {
    Person {
        name: "John Doe".into(),
        value: 42,
        items: vec![1, 2, 3],
    }
}

#[graphyaml_testhelpers::test]
fn default_style_flow_writes_everything_inline() -> Result<(), IPanic> {
    let mut serializer = Serializer::with_settings(SerializerSettings {
        default_style: DataStyle::Flow,
        ..SerializerSettings::default()
    });
    let text = serializer.to_string(&john())?;
    assert_eq!(text, "{Items: [1, 2, 3], Name: John Doe, Value: 42}\n");
    assert_eq!(serializer.from_str::<Person>(&text)?, john());
    Ok(())
}

#[graphyaml_testhelpers::test]
fn default_style_block() -> Result<(), IPanic> {
    let text = to_string(&john())?;
    assert_eq!(text, "Items:\n  - 1\n  - 2\n  - 3\nName: John Doe\nValue: 42\n");
    Ok(())
}

#[graphyaml_testhelpers::test]
fn indentation_follows_settings() -> Result<(), IPanic> {
    let mut serializer = Serializer::with_settings(SerializerSettings {
        indent: 4,
        ..SerializerSettings::default()
    });
    let text = serializer.to_string(&john())?;
    assert_eq!(text, "Items:\n    - 1\n    - 2\n    - 3\nName: John Doe\nValue: 42\n");
    assert_eq!(serializer.from_str::<Person>(&text)?, john());
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Texts {
    f1: String,
    f2: String,
    f3: String,
    f4: String,
    f5: String,
    f6: String,
}

impl Reflect for Texts {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("f1", |t| &t.f1, |t| &mut t.f1)
            .member("f2", |t| &t.f2, |t| &mut t.f2)
            .member("f3", |t| &t.f3, |t| &mut t.f3)
            .member("f4", |t| &t.f4, |t| &mut t.f4)
            .member("f5", |t| &t.f5, |t| &mut t.f5)
            .member("f6", |t| &t.f6, |t| &mut t.f6)
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn numeric_strings_are_quoted() -> Result<(), IPanic> {
    let texts = Texts {
        f1: "1.2".into(),
        f2: "1e3".into(),
        f3: "-0.0".into(),
        f4: ".inf".into(),
        f5: "1234".into(),
        f6: "-2".into(),
    };
    let text = to_string(&texts)?;
    assert_eq!(
        text,
        "f1: \"1.2\"\nf2: \"1e3\"\nf3: \"-0.0\"\nf4: \".inf\"\nf5: \"1234\"\nf6: \"-2\"\n"
    );
    assert_eq!(from_str::<Texts>(&text)?, texts);
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Bools {
    b1: bool,
    b2: bool,
    s1: String,
    s2: String,
}

impl Reflect for Bools {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("b1", |b| &b.b1, |b| &mut b.b1)
            .member("b2", |b| &b.b2, |b| &mut b.b2)
            .member("s1", |b| &b.s1, |b| &mut b.s1)
            .member("s2", |b| &b.s2, |b| &mut b.s2)
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn boolean_strings_are_quoted() -> Result<(), IPanic> {
    let bools = Bools {
        b1: true,
        b2: false,
        s1: "true".into(),
        s2: "false".into(),
    };
    let text = to_string(&bools)?;
    assert_eq!(text, "b1: true\nb2: false\ns1: \"true\"\ns2: \"false\"\n");
    assert_eq!(from_str::<Bools>(&text)?, bools);
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Nulls {
    n: Option<String>,
    s: String,
}

impl Reflect for Nulls {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("n", |x| &x.n, |x| &mut x.n)
            .member("s", |x| &x.s, |x| &mut x.s)
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn null_and_null_text_stay_apart() -> Result<(), IPanic> {
    let nulls = Nulls {
        n: None,
        s: "null".into(),
    };
    let text = to_string(&nulls)?;
    assert_eq!(text, "n: null\ns: \"null\"\n");
    assert_eq!(from_str::<Nulls>(&text)?, nulls);

    let read = |n: &str| from_str::<Nulls>(&format!("n: {n}\n")).map(|x| x.n);
    assert_eq!(read("\"null\"")?, Some("null".to_owned()));
    assert_eq!(read("'null'")?, Some("null".to_owned()));
    assert_eq!(read("null")?, None);
    assert_eq!(read("")?, None);
    assert_eq!(from_str::<Nulls>("s: x\n")?.n, None);
    Ok(())
}

#[graphyaml_testhelpers::test]
fn null_into_a_plain_member_keeps_the_default() -> Result<(), IPanic> {
    let nulls = from_str::<Nulls>("s: null\n")?;
    assert_eq!(nulls.s, "");
    Ok(())
}

#[graphyaml_testhelpers::test]
fn ignore_nulls_drops_null_members() -> Result<(), IPanic> {
    let mut serializer = Serializer::with_settings(SerializerSettings {
        ignore_nulls: true,
        ..SerializerSettings::default()
    });
    let nulls = Nulls {
        n: None,
        s: "x".into(),
    };
    assert_eq!(serializer.to_string(&nulls)?, "s: x\n");
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct WithDefaults {
    port: u16,
    host: String,
}

impl Reflect for WithDefaults {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member_with("Port", |w| &w.port, |w| &mut w.port, |m| m.default_value(8080u16))
            .member("Host", |w| &w.host, |w| &mut w.host)
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn default_values_are_omitted_unless_requested() -> Result<(), IPanic> {
    let value = WithDefaults {
        port: 8080,
        host: "localhost".into(),
    };
    assert_eq!(to_string(&value)?, "Host: localhost\n");

    let mut serializer = Serializer::with_settings(SerializerSettings {
        emit_default_values: true,
        ..SerializerSettings::default()
    });
    assert_eq!(serializer.to_string(&value)?, "Host: localhost\nPort: 8080\n");
    Ok(())
}

#[graphyaml_testhelpers::test]
fn types_without_a_factory_cannot_be_read() {
    let error = from_str::<WithDefaults>("Host: x\n").unwrap_err();
    assert!(matches!(error, Error::TypeShapeUnavailable { .. }), "{error:?}");
}

#[graphyaml_testhelpers::test]
fn unknown_keys_are_rejected() {
    let error = from_str::<Person>("Name: x\nAge: 3\n").unwrap_err();
    assert!(
        matches!(&error, Error::UnknownMember { member, .. } if member == "Age"),
        "{error:?}"
    );
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Chars {
    chars: Vec<char>,
    text: String,
}

impl Reflect for Chars {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("Chars", |c| &c.chars, |c| &mut c.chars)
            .member("Text", |c| &c.text, |c| &mut c.text)
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn control_characters_round_trip() -> Result<(), IPanic> {
    let chars = Chars {
        chars: vec!['a', ' ', '\t', '\n', '\0', '\u{1}', '\u{7f}', '"', '\\', 'é'],
        text: "tab\there \u{7f} \"quoted\"".into(),
    };
    let text = to_string(&chars)?;
    assert!(text.contains("- \"\\u007f\"\n"), "{text}");
    assert!(text.contains("- \"\\0\"\n"), "{text}");
    assert_eq!(from_str::<Chars>(&text)?, chars);
    Ok(())
}

#[graphyaml_testhelpers::test]
fn multi_line_strings_use_literal_blocks() -> Result<(), IPanic> {
    let chars = Chars {
        chars: vec![],
        text: "first line\nsecond line\n".into(),
    };
    let text = to_string(&chars)?;
    assert_eq!(text, "Chars: []\nText: |\n  first line\n  second line\n");
    assert_eq!(from_str::<Chars>(&text)?, chars);
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Floats {
    doubles: Vec<f64>,
    singles: Vec<f32>,
}

impl Reflect for Floats {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::object::<Self>()
            .member("Doubles", |f| &f.doubles, |f| &mut f.doubles)
            .member("Singles", |f| &f.singles, |f| &mut f.singles)
            .constructible()
            .build()
    }
}

#[graphyaml_testhelpers::test]
fn floats_round_trip_bit_for_bit() -> Result<(), IPanic> {
    let floats = Floats {
        doubles: vec![
            0.1,
            -0.0,
            1.0,
            1e300,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ],
        singles: vec![0.1, f32::MAX, f32::MIN_POSITIVE, f32::NAN, f32::NEG_INFINITY],
    };
    let text = to_string(&floats)?;
    assert!(text.contains("- .nan\n") && text.contains("- -.inf\n"), "{text}");
    let back = from_str::<Floats>(&text)?;
    let bits64 = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    let bits32 = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits64(&back.doubles), bits64(&floats.doubles));
    assert_eq!(bits32(&back.singles), bits32(&floats.singles));
    Ok(())
}

#[graphyaml_testhelpers::test]
fn long_integers_keep_their_width_in_dynamic_lists() -> Result<(), IPanic> {
    let list: Vec<Object> = vec![
        Primitive::I32(5).into(),
        Primitive::I64(50_000_000_000_000).into(),
        Primitive::U64(u64::MAX).into(),
        Primitive::I64(7).into(),
    ];
    let mut serializer = Serializer::new();
    let text = serializer.to_string(&list)?;
    assert_eq!(text, "- 5\n- 50000000000000\n- 18446744073709551615\n- !!int 7\n");
    assert_eq!(serializer.from_str::<Vec<Object>>(&text)?, list);
    Ok(())
}

#[graphyaml_testhelpers::test]
fn integers_are_checked_against_the_member_width() {
    let error = from_str::<Vec<u8>>("- 300\n").unwrap_err();
    assert!(matches!(error, Error::InvalidScalar { .. }), "{error:?}");
}

#[graphyaml_testhelpers::test]
fn untyped_documents_read_as_maps_and_lists() -> Result<(), IPanic> {
    let mut serializer = Serializer::new();
    let value = serializer.deserialize("a: [1, two, 3.5]\nb: {c: true}\n")?;
    let text = serializer.serialize(&value, None, None)?;
    assert_eq!(text, "a:\n  - 1\n  - two\n  - 3.5\nb:\n  c: true\n");

    let root = serializer.deserialize_with_context("", Some(TypeKey::of::<Object>()), None)?.0;
    assert!(root.is_null());
    Ok(())
}

#[graphyaml_testhelpers::test]
fn syntax_errors_surface() {
    let error = from_str::<Person>("Name: [unclosed\n").unwrap_err();
    assert!(matches!(error, Error::Syntax { .. }), "{error:?}");
}
