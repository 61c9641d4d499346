//! Terminal and JSON presentation of records.
//!
//! Color is controlled globally through `colored::control`; this module only
//! decides layout.

use std::io::Write;

use colored::Colorize;
use markstash_core::model::tags::canonical_content;
use markstash_core::{Bookmark, SearchHit, TagCount};
use serde_json::{Map, Value};

use crate::cli::Field;
use crate::error::CliResult;

const ALL_FIELDS: [Field; 4] = [Field::Id, Field::Url, Field::Title, Field::Tags];

#[derive(Debug, Clone)]
pub struct Renderer {
    json: bool,
    fields: Vec<Field>,
}

impl Renderer {
    /// Empty `fields` selects every field.
    pub fn new(json: bool, fields: &[Field]) -> Self {
        let mut fields = if fields.is_empty() {
            ALL_FIELDS.to_vec()
        } else {
            fields.to_vec()
        };
        fields.sort();
        fields.dedup();
        Self { json, fields }
    }

    fn full_layout(&self) -> bool {
        self.fields.len() == ALL_FIELDS.len()
    }

    pub fn bookmarks<W: Write>(&self, out: &mut W, bookmarks: &[Bookmark]) -> CliResult<()> {
        if self.json {
            let records = bookmarks
                .iter()
                .map(|bookmark| self.json_record(bookmark).map(Value::Object))
                .collect::<CliResult<Vec<_>>>()?;
            return self.write_json(out, &Value::Array(records));
        }

        for bookmark in bookmarks {
            self.text_record(out, bookmark.id as usize, bookmark, None)?;
        }
        Ok(())
    }

    /// Search results, numbered by rank rather than id.
    pub fn hits<W: Write>(&self, out: &mut W, hits: &[SearchHit]) -> CliResult<()> {
        if self.json {
            let records = hits
                .iter()
                .map(|hit| -> CliResult<Value> {
                    let mut record = Map::new();
                    record.insert("rank".into(), Value::from(hit.rank));
                    record.extend(self.json_record(&hit.bookmark)?);
                    Ok(Value::Object(record))
                })
                .collect::<CliResult<Vec<_>>>()?;
            return self.write_json(out, &Value::Array(records));
        }

        for hit in hits {
            self.text_record(out, hit.rank, &hit.bookmark, Some(hit.bookmark.id))?;
        }
        Ok(())
    }

    pub fn tag_counts<W: Write>(&self, out: &mut W, counts: &[TagCount]) -> CliResult<()> {
        if self.json {
            let records = counts
                .iter()
                .map(|entry| {
                    let mut record = Map::new();
                    record.insert("tag".into(), Value::from(entry.tag.as_str()));
                    record.insert("count".into(), Value::from(entry.count));
                    Value::Object(record)
                })
                .collect::<Vec<_>>();
            return self.write_json(out, &Value::Array(records));
        }

        for (idx, entry) in counts.iter().enumerate() {
            writeln!(
                out,
                "{}. {} ({})",
                (idx + 1).to_string().yellow().bold(),
                entry.tag.cyan(),
                entry.count
            )?;
        }
        Ok(())
    }

    /// Serialized record restricted to the selected fields, tags without
    /// their wrapping delimiters.
    fn json_record(&self, bookmark: &Bookmark) -> CliResult<Map<String, Value>> {
        let mut record = match serde_json::to_value(bookmark)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        record.insert(
            Field::Tags.key().into(),
            Value::from(canonical_content(&bookmark.tags)),
        );
        record.retain(|key, _| self.fields.iter().any(|field| key.as_str() == field.key()));
        Ok(record)
    }

    fn text_record<W: Write>(
        &self,
        out: &mut W,
        number: usize,
        bookmark: &Bookmark,
        id: Option<u32>,
    ) -> CliResult<()> {
        if !self.full_layout() {
            let columns = self
                .fields
                .iter()
                .map(|field| match field {
                    Field::Id => bookmark.id.to_string(),
                    Field::Url => bookmark.url.clone(),
                    Field::Title => bookmark.title.clone(),
                    Field::Tags => canonical_content(&bookmark.tags).to_string(),
                })
                .collect::<Vec<_>>();
            writeln!(out, "{}", columns.join("\t"))?;
            return Ok(());
        }

        let title = if bookmark.title.is_empty() {
            "Untitled".dimmed().to_string()
        } else {
            bookmark.title.green().bold().to_string()
        };
        match id {
            Some(id) => writeln!(
                out,
                "{}. {} [{}]",
                number.to_string().yellow().bold(),
                title,
                id
            )?,
            None => writeln!(out, "{}. {}", number.to_string().yellow().bold(), title)?,
        }
        writeln!(out, "   {} {}", ">".red(), bookmark.url.cyan())?;
        let tags = canonical_content(&bookmark.tags);
        if !tags.is_empty() {
            writeln!(out, "   {} {}", "#".red(), tags.magenta())?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_json<W: Write>(&self, out: &mut W, value: &Value) -> CliResult<()> {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Renderer;
    use crate::cli::Field;
    use markstash_core::{Bookmark, SearchHit};

    fn sample() -> Bookmark {
        Bookmark {
            id: 3,
            url: "https://example.com".into(),
            title: "Example".into(),
            tags: ",web,deep dive,".into(),
        }
    }

    fn render_text(renderer: &Renderer, bookmarks: &[Bookmark]) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        renderer.bookmarks(&mut out, bookmarks).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn full_text_layout_shows_id_title_url_and_tags() {
        let text = render_text(&Renderer::new(false, &[]), &[sample()]);
        assert_eq!(
            text,
            "3. Example\n   > https://example.com\n   # web,deep dive\n\n"
        );
    }

    #[test]
    fn field_subset_prints_tab_separated_columns_in_fixed_order() {
        let renderer = Renderer::new(false, &[Field::Tags, Field::Url, Field::Url]);
        let text = render_text(&renderer, &[sample()]);
        assert_eq!(text, "https://example.com\tweb,deep dive\n");
    }

    #[test]
    fn json_hits_carry_rank_and_selected_fields() {
        let renderer = Renderer::new(true, &[Field::Id, Field::Url]);
        let hits = vec![SearchHit {
            rank: 1,
            bookmark: sample(),
        }];
        let mut out = Vec::new();
        renderer.hits(&mut out, &hits).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "rank": 1, "id": 3, "url": "https://example.com" }])
        );
    }
}
