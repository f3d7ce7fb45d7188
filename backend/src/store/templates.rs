//! Template records: slide text plus embedded images.

use crate::error::{Error, Result};
use common::model::template::{Image, Template};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// Insert or update a template, replacing its image set when one is given.
///
/// A template without an id gets a fresh one. Returns the stored id.
pub fn save_template(conn: &Connection, payload: &Template) -> Result<String> {
    if payload.text.trim().is_empty() {
        return Err(Error::Backend("template text must not be empty".to_string()));
    }
    let id = if payload.id.trim().is_empty() {
        Uuid::new_v4().simple().to_string()
    } else {
        payload.id.trim().to_string()
    };

    conn.execute(
        "INSERT INTO templates (id, name, text) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, text = excluded.text",
        params![&id, &payload.name, &payload.text],
    )?;

    if let Some(images) = &payload.images {
        let existing_ids: Vec<String> = conn
            .prepare("SELECT id FROM images WHERE template_id = ?1")?
            .query_map(params![&id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        for old_id in &existing_ids {
            if !images.iter().any(|img| &img.id == old_id) {
                conn.execute(
                    "DELETE FROM images WHERE id = ?1 AND template_id = ?2",
                    params![old_id, &id],
                )?;
            }
        }

        for image in images {
            conn.execute(
                "INSERT OR REPLACE INTO images (id, template_id, base64) VALUES (?1, ?2, ?3)",
                params![&image.id, &id, &image.base64],
            )?;
        }
    }

    Ok(id)
}

/// Fetch a template with its images, `None` if it does not exist.
pub fn get_template(conn: &Connection, template_id: &str) -> Result<Option<Template>> {
    let template = conn
        .query_row(
            "SELECT id, name, text FROM templates WHERE id = ?1",
            params![template_id],
            |row| {
                Ok(Template {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    text: row.get(2)?,
                    images: None,
                })
            },
        )
        .optional()?;

    let Some(mut template) = template else {
        return Ok(None);
    };

    let images = load_images(conn, template_id)?;
    if !images.is_empty() {
        template.images = Some(images);
    }
    Ok(Some(template))
}

/// Images of one template in insertion order.
pub fn load_images(conn: &Connection, template_id: &str) -> Result<Vec<Image>> {
    let mut stmt = conn.prepare("SELECT id, base64 FROM images WHERE template_id = ?1 ORDER BY id")?;
    let images = stmt
        .query_map(params![template_id], |row| {
            Ok(Image {
                id: row.get(0)?,
                base64: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_in_memory;

    fn template(id: &str, images: Option<Vec<Image>>) -> Template {
        Template {
            id: id.to_string(),
            name: "Certificate".to_string(),
            text: "Awarded to <<Name>>\n---\n[img:logo]".to_string(),
            images,
        }
    }

    fn image(id: &str) -> Image {
        Image {
            id: id.to_string(),
            base64: "aGVsbG8=".to_string(),
        }
    }

    #[test]
    fn saving_without_id_generates_a_resolvable_one() {
        let conn = open_in_memory().unwrap();
        let id = save_template(&conn, &template("", None)).unwrap();
        assert_eq!(id.len(), 32);
        assert_eq!(crate::engine::extract_id(&id), Some(id.as_str()));
        assert!(get_template(&conn, &id).unwrap().is_some());
    }

    #[test]
    fn resaving_replaces_removed_images() {
        let conn = open_in_memory().unwrap();
        let id = save_template(&conn, &template("t1", Some(vec![image("logo"), image("sig")]))).unwrap();
        save_template(&conn, &template(&id, Some(vec![image("logo")]))).unwrap();

        let stored = get_template(&conn, "t1").unwrap().unwrap();
        let ids: Vec<_> = stored.images.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["logo"]);
    }

    #[test]
    fn missing_template_is_none_and_empty_text_is_rejected() {
        let conn = open_in_memory().unwrap();
        assert!(get_template(&conn, "nope").unwrap().is_none());

        let mut empty = template("t2", None);
        empty.text = "  ".to_string();
        assert!(save_template(&conn, &empty).is_err());
    }
}
