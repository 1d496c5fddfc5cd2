use crate::core::item::{ItemReader, ItemReaderResult};
use crate::error::BatchError;
use log::{debug, error};
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader as XmlReader;
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str;

/// A builder for creating XML item readers.
///
/// This builder helps configure XML readers with:
/// - A tag name to identify items (fragments) in the XML
/// - Buffer capacity for performance tuning
/// - The input source: a file path, or any `Read` such as an embedded resource
///
/// # Examples
///
/// ```
/// use batch_xml_to_db::item::xml::XmlItemReaderBuilder;
/// use batch_xml_to_db::core::item::ItemReader;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Person {
///     #[serde(rename = "@id")]
///     id: i32,
///     name: String,
///     age: i32,
/// }
///
/// let xml_data = r#"
/// <people>
///   <person id="1">
///     <name>Alice</name>
///     <age>30</age>
///   </person>
///   <person id="2">
///     <name>Bob</name>
///     <age>25</age>
///   </person>
/// </people>
/// "#;
///
/// let reader = XmlItemReaderBuilder::<Person>::new()
///     .tag("person")
///     .from_reader(xml_data.as_bytes());
///
/// let mut persons = Vec::new();
/// while let Some(person) = reader.read().unwrap() {
///     persons.push(person);
/// }
///
/// assert_eq!(persons.len(), 2);
/// assert_eq!(persons[0].id, 1);
/// assert_eq!(persons[0].name, "Alice");
/// assert_eq!(persons[1].name, "Bob");
/// ```
pub struct XmlItemReaderBuilder<T: DeserializeOwned> {
    tag_name: Option<String>,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Default for XmlItemReaderBuilder<T> {
    fn default() -> Self {
        Self {
            tag_name: None,
            capacity: 1024,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> XmlItemReaderBuilder<T> {
    /// Creates a new XML item reader builder.
    ///
    /// By default, it will:
    /// - Look for XML elements matching the type name
    /// - Use a buffer capacity of 1024 bytes
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the buffer capacity for the XML reader.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the name of the element holding one item.
    ///
    /// Every element with this name, at any depth, is deserialized into one `T`.
    pub fn tag<S: AsRef<str>>(mut self, tag_name: S) -> Self {
        self.tag_name = Some(tag_name.as_ref().to_string());
        self
    }

    fn item_tag(&self) -> Vec<u8> {
        match &self.tag_name {
            Some(tag) => tag.clone().into_bytes(),
            None => {
                // Default tag name is derived from the type name
                let type_str = type_name::<T>();
                let tag_name = type_str.split("::").last().unwrap_or(type_str);
                tag_name.as_bytes().to_vec()
            }
        }
    }

    /// Creates an XML item reader from a reader, such as an in-memory buffer or
    /// a resource embedded with `include_bytes!`.
    ///
    /// ```
    /// use batch_xml_to_db::item::xml::XmlItemReaderBuilder;
    /// use batch_xml_to_db::core::item::ItemReader;
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Deserialize)]
    /// struct Person {
    ///     name: String,
    ///     age: i32,
    /// }
    ///
    /// let xml_data = "<people><person><name>Alice</name><age>30</age></person></people>";
    ///
    /// let reader = XmlItemReaderBuilder::<Person>::new()
    ///     .tag("person")
    ///     .from_reader(xml_data.as_bytes());
    ///
    /// let first_person = reader.read().unwrap().unwrap();
    /// assert_eq!(first_person.name, "Alice");
    /// assert_eq!(first_person.age, 30);
    ///
    /// assert!(reader.read().unwrap().is_none());
    /// ```
    pub fn from_reader<R: Read + 'static>(self, reader: R) -> XmlItemReader<T> {
        XmlItemReader {
            reader: RefCell::new(Some(xml_reader(Box::new(reader), self.capacity))),
            path: None,
            capacity: self.capacity,
            buffer: RefCell::new(Vec::with_capacity(1024)),
            item_tag_name: self.item_tag(),
            closed: Cell::new(false),
            _marker: PhantomData,
        }
    }

    /// Creates an XML item reader from a file path.
    ///
    /// The file is opened when the reader is opened (or on the first read), so a
    /// missing file fails the step using the reader with
    /// [`BatchError::ResourceNotFound`] before anything is read.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> XmlItemReader<T> {
        XmlItemReader {
            reader: RefCell::new(None),
            path: Some(path.as_ref().to_path_buf()),
            capacity: self.capacity,
            buffer: RefCell::new(Vec::with_capacity(1024)),
            item_tag_name: self.item_tag(),
            closed: Cell::new(false),
            _marker: PhantomData,
        }
    }
}

type EventReader = XmlReader<BufReader<Box<dyn Read>>>;

fn xml_reader(rdr: Box<dyn Read>, capacity: usize) -> EventReader {
    let buf_reader = BufReader::with_capacity(capacity, rdr);
    let mut xml_reader = XmlReader::from_reader(buf_reader);
    // Text inside fragments is copied verbatim, including spaces around entity references
    xml_reader.config_mut().trim_text(false);
    xml_reader
}

/// A forward-only reader deserializing every fragment element of an XML
/// document into an item.
///
/// Each fragment (start tag with its attributes, nested elements, text, entity
/// references and CDATA) is extracted and handed to `quick-xml`'s serde
/// deserializer. Malformed XML and fragments that cannot be deserialized are
/// returned as [`BatchError::ItemReader`]; nothing is skipped.
pub struct XmlItemReader<T> {
    reader: RefCell<Option<EventReader>>,
    path: Option<PathBuf>,
    capacity: usize,
    buffer: RefCell<Vec<u8>>,
    item_tag_name: Vec<u8>,
    closed: Cell<bool>,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> XmlItemReader<T> {
    fn open_file(&self) -> Result<(), BatchError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = File::open(path).map_err(|e| {
            error!("Failed to open XML file {}: {}", path.display(), e);
            if e.kind() == ErrorKind::NotFound {
                BatchError::ResourceNotFound {
                    resource: path.display().to_string(),
                    source: e,
                }
            } else {
                BatchError::ItemReader(format!(
                    "Failed to open XML file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        debug!("Opened XML file {}", path.display());
        *self.reader.borrow_mut() = Some(xml_reader(Box::new(file), self.capacity));
        Ok(())
    }

    /// Skips events until the next fragment and deserializes it.
    fn next_item(&self, reader: &mut EventReader, buffer: &mut Vec<u8>) -> ItemReaderResult<T> {
        debug!(
            "Looking for tag: '{}'",
            str::from_utf8(&self.item_tag_name).unwrap_or("<binary>")
        );

        loop {
            buffer.clear();
            let event = reader
                .read_event_into(buffer)
                .map_err(|e| BatchError::ItemReader(format!("XML parsing error: {}", e)))?;

            match event {
                Event::Start(e) if e.name().as_ref() == self.item_tag_name.as_slice() => {
                    let start = e.into_owned();
                    let xml_string = read_fragment(reader, buffer, &start)?;
                    return deserialize(&xml_string).map(Some);
                }
                Event::Empty(e) if e.name().as_ref() == self.item_tag_name.as_slice() => {
                    let mut xml_string = String::new();
                    push_start_tag(&mut xml_string, &e, true)?;
                    return deserialize(&xml_string).map(Some);
                }
                Event::Eof => {
                    debug!("Reached end of file");
                    return Ok(None);
                }
                _ => continue, // Skip other events
            }
        }
    }
}

/// Reads the events of the fragment opened by `start` up to its end tag and
/// returns the whole fragment as an XML string.
///
/// Whitespace-only text is dropped when it only separates tags (indentation);
/// between two pieces of content, such as two entity references, it is kept.
fn read_fragment(
    reader: &mut EventReader,
    buffer: &mut Vec<u8>,
    start: &BytesStart,
) -> Result<String, BatchError> {
    let mut xml_string = String::new();
    push_start_tag(&mut xml_string, start, false)?;

    let mut depth = 1;
    // Set while the last event copied was text, an entity reference or CDATA
    let mut in_content = false;
    let mut pending_whitespace = String::new();

    while depth > 0 {
        buffer.clear();
        let event = reader
            .read_event_into(buffer)
            .map_err(|e| BatchError::ItemReader(format!("XML parsing error: {}", e)))?;

        match event {
            Event::Text(ref text) => {
                let text = utf8(text)?;
                if text.bytes().all(|b| b.is_ascii_whitespace()) {
                    if in_content {
                        pending_whitespace.push_str(text);
                    }
                    continue;
                }
                xml_string.push_str(&pending_whitespace);
                xml_string.push_str(text);
            }
            Event::GeneralRef(ref reference) => {
                xml_string.push_str(&pending_whitespace);
                xml_string.push('&');
                xml_string.push_str(utf8(reference)?);
                xml_string.push(';');
            }
            Event::CData(ref cdata) => {
                xml_string.push_str(&pending_whitespace);
                xml_string.push_str("<![CDATA[");
                xml_string.push_str(utf8(cdata)?);
                xml_string.push_str("]]>");
            }
            Event::Start(ref start) => {
                depth += 1;
                push_start_tag(&mut xml_string, start, false)?;
            }
            Event::Empty(ref empty) => push_start_tag(&mut xml_string, empty, true)?,
            Event::End(ref end) => {
                depth -= 1;
                xml_string.push_str("</");
                xml_string.push_str(utf8(end.name().as_ref())?);
                xml_string.push('>');
            }
            Event::Eof => {
                return Err(BatchError::ItemReader(format!(
                    "Unexpected end of file inside element: {}",
                    xml_string
                )));
            }
            // Comments, processing instructions and declarations carry no item data
            _ => continue,
        }

        pending_whitespace.clear();
        in_content = matches!(
            event,
            Event::Text(_) | Event::GeneralRef(_) | Event::CData(_)
        );
    }

    Ok(xml_string)
}

fn utf8(bytes: &[u8]) -> Result<&str, BatchError> {
    str::from_utf8(bytes)
        .map_err(|e| BatchError::ItemReader(format!("Invalid UTF-8 in XML document: {}", e)))
}

/// Appends `<name attr="value" ...>` (or `/>` when `empty`) to `xml_string`.
/// Attribute values are copied as found in the document, still escaped.
/// Duplicate or unquoted attributes are errors.
fn push_start_tag(
    xml_string: &mut String,
    start: &BytesStart,
    empty: bool,
) -> Result<(), BatchError> {
    xml_string.push('<');
    xml_string.push_str(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            BatchError::ItemReader(format!("Invalid attribute in XML document: {}", e))
        })?;
        xml_string.push(' ');
        xml_string.push_str(utf8(attr.key.as_ref())?);
        xml_string.push_str("=\"");
        xml_string.push_str(&utf8(&attr.value)?.replace('"', "&quot;"));
        xml_string.push('"');
    }
    if empty {
        xml_string.push_str("/>");
    } else {
        xml_string.push('>');
    }
    Ok(())
}

fn deserialize<T: DeserializeOwned>(xml_string: &str) -> Result<T, BatchError> {
    debug!("Finished reading XML item: {}", xml_string);

    from_str(xml_string).map_err(|e| {
        error!("Failed to deserialize XML item: {} from: {}", e, xml_string);
        BatchError::ItemReader(format!(
            "Failed to deserialize XML item: {} from: {}",
            e, xml_string
        ))
    })
}

impl<T: DeserializeOwned> ItemReader<T> for XmlItemReader<T> {
    /// Reads the next item. Once the reader is closed, every read returns
    /// `Ok(None)`: the document is never read a second time.
    fn read(&self) -> ItemReaderResult<T> {
        if self.closed.get() {
            return Ok(None);
        }

        if self.reader.borrow().is_none() {
            self.open_file()?;
        }

        let mut reader = self.reader.borrow_mut();
        let mut buffer = self.buffer.borrow_mut();

        match reader.as_mut() {
            Some(reader) => self.next_item(reader, &mut buffer),
            None => Ok(None),
        }
    }

    fn open(&self) -> Result<(), BatchError> {
        if self.closed.get() {
            return Err(BatchError::ItemReader(
                "XML reader is closed and cannot be reopened".to_string(),
            ));
        }

        if self.reader.borrow().is_none() {
            self.open_file()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), BatchError> {
        self.closed.set(true);
        self.reader.borrow_mut().take();
        Ok(())
    }
}
