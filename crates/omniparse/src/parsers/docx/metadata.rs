//! Core-properties metadata from `docProps/core.xml`.

use crate::processors::metadata_extractor::parse_publication_date;
use crate::types::Metadata;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Raw Dublin Core fields from the core-properties part.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub last_modified_by: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// Parse `docProps/core.xml`.
pub fn parse_core_properties(xml: &str) -> CoreProperties {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = false;

    let mut properties = CoreProperties::default();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let raw = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let local = raw.rsplit(':').next().unwrap_or(&raw).to_string();
                current = Some(local);
            }
            Ok(Event::Text(e)) => {
                if let Some(field) = current.as_deref() {
                    let value = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                    if value.is_empty() {
                        continue;
                    }
                    let slot = match field {
                        "title" => &mut properties.title,
                        "creator" => &mut properties.creator,
                        "subject" => &mut properties.subject,
                        "description" => &mut properties.description,
                        "keywords" => &mut properties.keywords,
                        "lastModifiedBy" => &mut properties.last_modified_by,
                        "created" => &mut properties.created,
                        "modified" => &mut properties.modified,
                        _ => continue,
                    };
                    if slot.is_none() {
                        *slot = Some(value);
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    properties
}

/// Map core properties into document metadata.
pub fn metadata_from_core_properties(properties: CoreProperties, file_size: u64) -> Metadata {
    let mut metadata = Metadata::new("docx");
    metadata.file_size = file_size;
    metadata.title = properties.title;

    if let Some(author) = properties.creator {
        metadata = metadata.with_author(author);
    }

    // Keywords split on `;` or `,` into tags.
    if let Some(keywords) = &properties.keywords {
        metadata.tags = keywords
            .split([';', ','])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
    }

    // Description from subject, falling back to the comments field.
    metadata.description = properties.subject.or(properties.description);

    metadata.publication_date = properties
        .created
        .as_deref()
        .or(properties.modified.as_deref())
        .and_then(parse_publication_date);

    if let Some(last_modified_by) = properties.last_modified_by {
        metadata.custom_fields.insert(
            "last_modified_by".to_string(),
            serde_json::json!(last_modified_by),
        );
    }
    if let Some(modified) = properties.modified {
        metadata
            .custom_fields
            .insert("modified".to_string(), serde_json::json!(modified));
    }

    metadata
}
