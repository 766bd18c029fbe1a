//! XML rendering for resources.
//!
//! Resources cross the wire as JSON objects; this module derives the XML
//! form from that shape. Primitive fields become empty elements carrying a
//! `value` attribute, arrays repeat their element name once per item,
//! objects nest, and an object that carries its own `resourceType` (a
//! contained resource, e.g. a bundle entry) is rendered as a full resource
//! element inside its wrapper. Only the document root declares the FHIR
//! namespace, and no XML declaration is emitted.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use serde_json::Value;
use thiserror::Error;

use crate::resources::AnyResource;

const FHIR_NAMESPACE: &str = "http://hl7.org/fhir";

/// The resource could not be serialized as an XML document.
#[derive(Debug, Error)]
#[error("failed to render resource as XML")]
pub struct XmlError;

type XmlWriter = Writer<Vec<u8>>;

/// Render a resource as a FHIR XML document, minified or indented by two
/// spaces when `pretty` is set.
pub fn render_xml(resource: &AnyResource, pretty: bool) -> Result<String, XmlError> {
    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    write_resource(&mut writer, resource.resource_type(), resource.fields(), true)?;
    String::from_utf8(writer.into_inner()).map_err(|_| XmlError)
}

fn write_resource<'a>(
    writer: &mut XmlWriter,
    type_name: &str,
    fields: impl Iterator<Item = (&'a str, &'a Value)>,
    root: bool,
) -> Result<(), XmlError> {
    let mut element = BytesStart::new(type_name);
    if root {
        element.push_attribute(("xmlns", FHIR_NAMESPACE));
    }
    writer
        .write_event(Event::Start(element))
        .map_err(|_| XmlError)?;
    for (name, value) in fields {
        if name != "resourceType" {
            write_field(writer, name, value)?;
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(type_name)))
        .map_err(|_| XmlError)
}

fn write_field(writer: &mut XmlWriter, name: &str, value: &Value) -> Result<(), XmlError> {
    match value {
        Value::Null => Ok(()),
        Value::Bool(flag) => write_primitive(writer, name, if *flag { "true" } else { "false" }),
        Value::Number(number) => write_primitive(writer, name, &number.to_string()),
        Value::String(text) => write_primitive(writer, name, text),
        Value::Array(items) => {
            for item in items {
                write_field(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(object) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(|_| XmlError)?;
            match object.get("resourceType") {
                Some(Value::String(contained_type)) => {
                    let contained = object.iter().map(|(k, v)| (k.as_str(), v));
                    write_resource(writer, contained_type, contained, false)?;
                }
                _ => {
                    for (inner_name, inner_value) in object {
                        write_field(writer, inner_name, inner_value)?;
                    }
                }
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(|_| XmlError)
        }
    }
}

fn write_primitive(writer: &mut XmlWriter, name: &str, value: &str) -> Result<(), XmlError> {
    let mut element = BytesStart::new(name);
    element.push_attribute(("value", value));
    writer
        .write_event(Event::Empty(element))
        .map_err(|_| XmlError)
}
