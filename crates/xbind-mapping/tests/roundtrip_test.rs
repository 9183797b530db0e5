//! Round-trip tests for fully-mapped object graphs.

use xbind_mapping::{
    ConverterRef, DescriptorBuilder, ElementBinding, ElementTarget, FieldAccessor,
    MappingRegistry, ObjectGraphConverter, ScalarBinding, VecSequence,
};
use xbind_tree::{Element, ElementCursor, ElementWriter, QName};

#[derive(Debug, Default, PartialEq)]
struct Person {
    id: Option<i32>,
    name: String,
    tags: Vec<String>,
    address: Option<Address>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    zip: String,
    city: String,
}

fn registry() -> MappingRegistry {
    let mut registry = MappingRegistry::new();
    registry.install_default_converters();

    registry.register(
        DescriptorBuilder::<Address>::new("Address")
            .attribute(
                QName::local("zip"),
                ScalarBinding::new(
                    FieldAccessor::new("zip", |a: &Address| &a.zip, |a, v| a.zip = v),
                    ConverterRef::of::<String>(),
                ),
            )
            .element(
                QName::local("city"),
                ElementBinding::single(
                    FieldAccessor::new("city", |a: &Address| &a.city, |a, v| a.city = v),
                    ElementTarget::text(ConverterRef::of::<String>()),
                ),
            )
            .build()
            .unwrap(),
    );

    registry.register(
        DescriptorBuilder::<Person>::new("Person")
            .attribute(
                QName::local("id"),
                ScalarBinding::new(
                    FieldAccessor::optional(
                        "id",
                        |p: &Person| p.id.as_ref(),
                        |p, v| p.id = Some(v),
                    ),
                    ConverterRef::of::<i32>(),
                ),
            )
            .element(
                QName::local("name"),
                ElementBinding::single(
                    FieldAccessor::new("name", |p: &Person| &p.name, |p, v| p.name = v),
                    ElementTarget::text(ConverterRef::of::<String>()),
                ),
            )
            .element(
                QName::local("tag"),
                ElementBinding::collection(
                    FieldAccessor::new("tags", |p: &Person| &p.tags, |p, v| p.tags = v),
                    VecSequence::<String>::new(),
                    ElementTarget::text(ConverterRef::of::<String>()),
                ),
            )
            .element(
                QName::local("address"),
                ElementBinding::single(
                    FieldAccessor::optional(
                        "address",
                        |p: &Person| p.address.as_ref(),
                        |p, v| p.address = Some(v),
                    ),
                    ElementTarget::mapped::<Address>(),
                ),
            )
            .build()
            .unwrap(),
    );

    registry
}

fn person_doc() -> Element {
    let mut root = Element::new(QName::local("person"));
    root.set_attribute(QName::local("id"), "7");
    root.add_child(Element::with_text(QName::local("name"), "Alice"));
    root.add_child(Element::with_text(QName::local("tag"), "a"));
    root.add_child(Element::with_text(QName::local("tag"), "b"));
    root
}

#[test]
fn person_scenario_reads_mapped_fields() {
    let registry = registry();
    let converter = ObjectGraphConverter::new(&registry);
    let doc = person_doc();

    let mut cursor = ElementCursor::new(&doc);
    let person: Person = converter.from_element(&mut cursor, None).unwrap();

    assert_eq!(person.id, Some(7));
    assert_eq!(person.name, "Alice");
    assert_eq!(person.tags, ["a", "b"]);
    assert_eq!(person.address, None);
}

#[test]
fn person_scenario_round_trips() -> anyhow::Result<()> {
    let registry = registry();
    let converter = ObjectGraphConverter::new(&registry);
    let doc = person_doc();

    let mut cursor = ElementCursor::new(&doc);
    let person: Person = converter.from_element(&mut cursor, None)?;

    let mut writer = ElementWriter::new();
    converter.to_element(&person, &QName::local("person"), &mut writer, None)?;
    let written = writer.finish().expect("balanced emission");

    assert_eq!(written, doc);
    Ok(())
}

#[test]
fn nested_mapped_object_round_trips() -> anyhow::Result<()> {
    let registry = registry();
    let converter = ObjectGraphConverter::new(&registry);

    let mut doc = person_doc();
    let mut address = Element::new(QName::local("address"));
    address.set_attribute(QName::local("zip"), "10117");
    address.add_child(Element::with_text(QName::local("city"), "Berlin"));
    doc.add_child(address);

    let mut cursor = ElementCursor::new(&doc);
    let person: Person = converter.from_element(&mut cursor, None)?;
    assert_eq!(
        person.address,
        Some(Address {
            zip: "10117".into(),
            city: "Berlin".into(),
        })
    );

    let mut writer = ElementWriter::new();
    converter.to_element(&person, &QName::local("person"), &mut writer, None)?;
    assert_eq!(writer.finish().expect("balanced emission"), doc);
    Ok(())
}

#[test]
fn write_order_follows_descriptor_not_document_order() {
    let registry = registry();
    let converter = ObjectGraphConverter::new(&registry);

    // tags before name in the document, the reverse of registration order
    let mut doc = Element::new(QName::local("person"));
    doc.add_child(Element::with_text(QName::local("tag"), "a"));
    doc.add_child(Element::with_text(QName::local("name"), "Alice"));

    let mut cursor = ElementCursor::new(&doc);
    let person: Person = converter.from_element(&mut cursor, None).unwrap();

    let mut writer = ElementWriter::new();
    converter
        .to_element(&person, &QName::local("person"), &mut writer, None)
        .unwrap();
    let written = writer.finish().unwrap();

    assert_eq!(written.children[0].name, QName::local("name"));
    assert_eq!(written.children[1].name, QName::local("tag"));
}

#[derive(Debug, Default, PartialEq)]
struct Price {
    currency: String,
    amount: f64,
}

#[test]
fn text_binding_round_trips_with_explicit_descriptor() -> anyhow::Result<()> {
    let mut registry = MappingRegistry::new();
    registry.install_default_converters();
    let converter = ObjectGraphConverter::new(&registry);

    let descriptor = DescriptorBuilder::<Price>::new("Price")
        .attribute(
            QName::local("currency"),
            ScalarBinding::new(
                FieldAccessor::new("currency", |p: &Price| &p.currency, |p, v| p.currency = v),
                ConverterRef::of::<String>(),
            ),
        )
        .text(ScalarBinding::new(
            FieldAccessor::new("amount", |p: &Price| &p.amount, |p, v| p.amount = v),
            ConverterRef::of::<f64>(),
        ))
        .build()
        .unwrap();

    let mut doc = Element::with_text(QName::local("price"), "9.95");
    doc.set_attribute(QName::local("currency"), "EUR");

    let mut cursor = ElementCursor::new(&doc);
    let boxed = converter.from_element_with(&mut cursor, &descriptor, None)?;
    let price = boxed.downcast_ref::<Price>().expect("a Price");
    assert_eq!(price.currency, "EUR");
    assert!((price.amount - 9.95).abs() < f64::EPSILON);

    let mut writer = ElementWriter::new();
    converter.to_element_with(
        boxed.as_ref(),
        &QName::local("price"),
        &descriptor,
        &mut writer,
        None,
    )?;
    assert_eq!(writer.finish().expect("balanced emission"), doc);
    Ok(())
}

#[test]
fn namespaced_names_match_bindings() {
    let ns = "urn:example:people";
    let mut registry = MappingRegistry::new();
    registry.install_default_converters();

    registry.register(
        DescriptorBuilder::<Person>::new("Person")
            .element(
                QName::namespaced(ns, "name"),
                ElementBinding::single(
                    FieldAccessor::new("name", |p: &Person| &p.name, |p, v| p.name = v),
                    ElementTarget::text(ConverterRef::of::<String>()),
                ),
            )
            .build()
            .unwrap(),
    );
    let converter = ObjectGraphConverter::new(&registry);

    let mut doc = Element::new(QName::namespaced(ns, "person"));
    doc.add_child(Element::with_text(QName::namespaced(ns, "name"), "Alice"));
    // same local name, no namespace: must not match the binding
    doc.add_child(Element::with_text(QName::local("name"), "Bob"));

    let mut cursor = ElementCursor::new(&doc);
    let person: Person = converter.from_element(&mut cursor, None).unwrap();
    assert_eq!(person.name, "Alice");
}
