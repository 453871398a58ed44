use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Local;
use tabled::Tabled;

use fitlog_core::models::{self, ProgressImage};

use super::helpers::{parse_date, print_json, print_table, resolve_id, short_id, truncate};
use super::{App, delete_record, load_records, save_record};

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// URLs are stored as-is; local files are inlined as a base64 data URL.
fn load_image(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(source.to_string());
    }
    let path = Path::new(source);
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    if bytes.is_empty() {
        bail!("Image file {} is empty", path.display());
    }
    Ok(data_url(mime_for(path), &bytes))
}

pub(crate) async fn cmd_photo_add(
    app: &App,
    source: &str,
    notes: Option<String>,
    tags: Vec<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let image = ProgressImage {
        id: models::new_id(),
        date: parse_date(date)?,
        time: Local::now().format("%H:%M").to_string(),
        image: load_image(source)?,
        notes,
        is_favorite: false,
        tags,
    };
    let saved = save_record(app, image, |t, i| t.add_image(i)).await?;

    if json {
        print_json(&saved)?;
    } else {
        println!(
            "Added progress photo {} for {} {}",
            short_id(&saved.id),
            saved.date,
            saved.time
        );
    }
    Ok(())
}

pub(crate) async fn cmd_photo_list(app: &App, favorites: bool, json: bool) -> Result<()> {
    let mut images = load_records(app, |t| t.images(false)).await;
    if favorites {
        images.retain(|i| i.is_favorite);
    }

    if json {
        return print_json(&images);
    }
    if images.is_empty() {
        eprintln!("No progress photos found.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct PhotoRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Fav")]
        favorite: &'static str,
        #[tabled(rename = "Tags")]
        tags: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<PhotoRow> = images
        .iter()
        .map(|i| PhotoRow {
            id: short_id(&i.id),
            date: i.date.to_string(),
            time: i.time.clone(),
            favorite: if i.is_favorite { "*" } else { "" },
            tags: i.tags.join(", "),
            source: truncate(&i.image, 32),
            notes: i.notes.as_deref().map(|n| truncate(n, 30)).unwrap_or_default(),
        })
        .collect();
    print_table(&rows, 0..0);
    Ok(())
}

pub(crate) async fn cmd_photo_favorite(app: &App, id: &str, json: bool) -> Result<()> {
    let updated = match app.remote() {
        Some(_) => {
            let images = load_records(app, |t| t.images(false)).await;
            let id = resolve_id(images.iter().map(|i| i.id.as_str()), id)?;
            let Some(mut image) = images.into_iter().find(|i| i.id == id) else {
                bail!("Progress image not found: {id}");
            };
            image.is_favorite = !image.is_favorite;
            save_record(app, image, |_, i| Ok(i)).await?
        }
        None => {
            let ids: Vec<String> = app.tracker.images(false).into_iter().map(|i| i.id).collect();
            let id = resolve_id(ids.iter().map(String::as_str), id)?;
            app.tracker.toggle_favorite(&id)?
        }
    };

    if json {
        print_json(&updated)?;
    } else if updated.is_favorite {
        println!("Marked {} as favorite", short_id(&updated.id));
    } else {
        println!("Removed {} from favorites", short_id(&updated.id));
    }
    Ok(())
}

pub(crate) async fn cmd_photo_delete(app: &App, id: &str, json: bool) -> Result<()> {
    let images = load_records(app, |t| t.images(false)).await;
    let id = resolve_id(images.iter().map(|i| i.id.as_str()), id)?;
    let deleted = delete_record::<ProgressImage, _>(app, &id, |t, id| t.delete_image(id)).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id, "found": deleted }));
    } else {
        println!("Deleted progress photo {}", short_id(&id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("dir/b.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("c")), "application/octet-stream");
    }

    #[test]
    fn test_load_image_inlines_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.png");
        std::fs::write(&path, b"abc").unwrap();
        let url = load_image(path.to_str().unwrap()).unwrap();
        assert_eq!(url, "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_load_image_keeps_urls() {
        let url = "https://cdn.example.com/p/1.jpg";
        assert_eq!(load_image(url).unwrap(), url);
    }

    #[test]
    fn test_load_image_missing_or_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image(dir.path().join("nope.png").to_str().unwrap()).is_err());
        let empty = dir.path().join("empty.jpg");
        std::fs::write(&empty, b"").unwrap();
        assert!(load_image(empty.to_str().unwrap()).is_err());
    }
}
