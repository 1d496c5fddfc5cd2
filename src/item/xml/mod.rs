/// XML support for reading structured data.
///
/// This module provides the component reading items from XML documents as part
/// of a batch processing pipeline. The implementation uses `quick-xml` for
/// event-based parsing and its serde support to map each fragment to an item.
///
/// # Features
///
/// - Fragments located by element name at any depth of the document
/// - Support for XML attributes via serde's `#[serde(rename = "@attribute_name")]`
/// - Automatic tag name inference from the item type name
/// - Malformed documents and unmappable fragments reported as errors
///
/// # Example
///
/// ```
/// use batch_xml_to_db::item::xml::XmlItemReaderBuilder;
/// use batch_xml_to_db::core::item::ItemReader;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Product {
///     #[serde(rename = "@id")]
///     id: String,
///     #[serde(rename = "@available")]
///     available: bool,
///     name: String,
///     price: f64,
///     #[serde(default)]
///     description: Option<String>,
/// }
///
/// let xml_data = r#"
/// <catalog>
///   <product id="P001" available="true">
///     <name>Wireless Headphones</name>
///     <price>79.99</price>
///     <description>Noise-cancelling wireless headphones</description>
///   </product>
///   <product id="P002" available="false">
///     <name>USB-C Cable</name>
///     <price>12.99</price>
///   </product>
/// </catalog>
/// "#;
///
/// let reader = XmlItemReaderBuilder::<Product>::new()
///     .tag("product")
///     .from_reader(xml_data.as_bytes());
///
/// let mut products = Vec::new();
/// while let Some(product) = reader.read().unwrap() {
///     products.push(product);
/// }
///
/// assert_eq!(products.len(), 2);
/// assert_eq!(products[0].id, "P001");
/// assert!(products[0].available);
/// assert!(products[0].description.is_some());
/// assert_eq!(products[1].price, 12.99);
/// assert!(products[1].description.is_none());
/// ```
pub mod xml_reader;

pub use xml_reader::{XmlItemReader, XmlItemReaderBuilder};
