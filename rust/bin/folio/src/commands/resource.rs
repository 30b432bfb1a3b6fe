//! Resource commands.
//!
//! `folio list skills`, `folio create project -f p.json --image cover.png`,
//! etc. Every call goes through the typed adapter; mutations first pass
//! the session guard.

use std::path::Path;

use anyhow::{Context, Result};
use folio_client::resource::ImageUpload;
use folio_client::{
    Article, Attachment, Experience, Folio, GuardState, ListEnvelope, ListFilter, Project, Resource,
    ResourceClient, Skill,
};
use serde_json::Value;

use super::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    #[value(alias = "experiences")]
    Experience,
    #[value(alias = "skills")]
    Skill,
    #[value(alias = "projects")]
    Project,
    #[value(alias = "articles")]
    Article,
}

/// Run `$body` with `$T` bound to the entity type behind `$kind`.
macro_rules! with_kind {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            Kind::Experience => {
                type $T = Experience;
                $body
            }
            Kind::Skill => {
                type $T = Skill;
                $body
            }
            Kind::Project => {
                type $T = Project;
                $body
            }
            Kind::Article => {
                type $T = Article;
                $body
            }
        }
    };
}

#[derive(Debug)]
pub struct ListQuery {
    pub page: u32,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

// ── Read ────────────────────────────────────────────────────────────

pub async fn list(config_path: &Path, kind: Kind, query: ListQuery, output: Output) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    let page_size = query.limit.unwrap_or(folio.page_size());
    let filter = ListFilter { search: query.search };
    with_kind!(kind, T => {
        let page = folio
            .resource::<T>()
            .list(query.page, page_size, &filter)
            .await
            .with_context(|| format!("Could not load {} records", T::ENTITY))?;
        print_list(&page, output)
    })
}

pub async fn get(config_path: &Path, kind: Kind, id: &str, output: Output) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    with_kind!(kind, T => {
        let record = folio.resource::<T>().get(id).await?;
        print_record(&record, output)
    })
}

// ── Write ───────────────────────────────────────────────────────────

pub async fn create(
    config_path: &Path,
    kind: Kind,
    json_body: &str,
    image: Option<&Path>,
    output: Output,
) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    require_owner(&folio).await?;

    match (kind, image) {
        (Kind::Project, Some(path)) => create_with_image(folio.projects(), json_body, path, output).await,
        (Kind::Article, Some(path)) => create_with_image(folio.articles(), json_body, path, output).await,
        (other, Some(_)) => anyhow::bail!("{other:?} records do not take an image upload."),
        (kind, None) => with_kind!(kind, T => {
            let record: T = parse_record(json_body)?;
            let created = folio.resource::<T>().create(&record).await?;
            report("created", created.as_ref(), output)
        }),
    }
}

async fn create_with_image<T: ImageUpload>(
    client: ResourceClient<T>,
    json_body: &str,
    path: &Path,
    output: Output,
) -> Result<()> {
    let record: T = parse_record(json_body)?;
    let attachment = Attachment::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let created = client.create_with_image(&record, attachment).await?;
    report("created", created.as_ref(), output)
}

pub async fn update(config_path: &Path, kind: Kind, id: &str, json_body: &str, output: Output) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    require_owner(&folio).await?;
    with_kind!(kind, T => {
        let record: T = parse_record(json_body)?;
        let updated = folio.resource::<T>().update(id, &record).await?;
        report("updated", updated.as_ref(), output)
    })
}

pub async fn delete(config_path: &Path, kind: Kind, id: &str) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    require_owner(&folio).await?;
    with_kind!(kind, T => {
        folio.resource::<T>().delete(id).await?;
        println!("{} {id} deleted.", T::ENTITY);
        Ok(())
    })
}

/// Management needs a live session with the owner role, the same rule
/// the navigation applies.
async fn require_owner(folio: &Folio) -> Result<()> {
    let mount = folio.guard().mount();
    match mount.resolve().await {
        Some(GuardState::Authorized(_)) => {}
        Some(GuardState::Unauthorized(prompt)) => {
            anyhow::bail!("{}: {} Run `folio login`.", prompt.title, prompt.message)
        }
        Some(GuardState::Checking) | None => anyhow::bail!("Session check did not complete."),
    }
    if !folio.menu().iter().any(|a| a.is_management()) {
        anyhow::bail!("Managing records requires the owner role.");
    }
    Ok(())
}

// ── Status ──────────────────────────────────────────────────────────

pub async fn status(config_path: &Path) -> Result<()> {
    let (config, folio) = super::open(config_path)?;

    println!("Server:    {}", config.server);
    println!("Session:   {}", config.session_path.display());
    match folio.session().current() {
        Some(claims) if claims.is_expired(folio.session().leeway_secs()) => {
            println!("User:      {} (expired, renews on next use)", claims.display_name())
        }
        Some(claims) => println!("User:      {}", claims.display_name()),
        None => println!("User:      not logged in"),
    }

    // Skills are public; one record is enough to prove the backend answers.
    match folio.skills().list(1, 1, &ListFilter::default()).await {
        Ok(_) => println!("Status:    connected"),
        Err(e) => match e.status {
            Some(status) => println!("Status:    error ({status})"),
            None => println!("Status:    disconnected ({})", e.message),
        },
    }
    Ok(())
}

// ── Output ──────────────────────────────────────────────────────────

fn parse_record<T: Resource>(json_body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(json_body).context("Invalid JSON")?;
    let Value::Object(map) = value else {
        anyhow::bail!("Expected a JSON object.");
    };
    folio_client::resource::normalize_record(map)
        .with_context(|| format!("Not a valid {} record", T::ENTITY))
}

/// Record as JSON, id included.
fn record_json<T: Resource>(record: &T) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let (Value::Object(map), Some(id)) = (&mut value, record.id()) {
        map.insert("id".into(), Value::String(id.to_string()));
    }
    Ok(value)
}

fn print_list<T: Resource>(page: &ListEnvelope<T>, output: Output) -> Result<()> {
    if output == Output::Json {
        let items = page.items.iter().map(record_json).collect::<Result<Vec<_>>>()?;
        return super::print_json(&serde_json::json!({
            "items": items,
            "page": page.page,
            "totalPages": page.total_pages,
            "recognized": page.recognized,
            "skipped": page.skipped,
        }));
    }

    if !page.recognized {
        println!("The backend answered without a {} list.", T::ENTITY);
        return Ok(());
    }
    if page.skipped > 0 {
        eprintln!("{} {} entries could not be read.", page.skipped, T::ENTITY);
    }
    if page.is_empty() {
        if page.skipped == 0 {
            println!("No {} records.", T::ENTITY);
        }
        return Ok(());
    }

    println!("{:<8} {:<40} {:<16} FEATURED", "ID", "TITLE", "STATUS");
    for item in &page.items {
        println!(
            "{:<8} {:<40} {:<16} {}",
            item.id().unwrap_or("-"),
            truncate(item.title(), 40),
            truncate(item.status(), 16),
            if item.featured() { "yes" } else { "" },
        );
    }
    println!();
    println!("Page {} of {}", page.page, page.total_pages);
    Ok(())
}

fn print_record<T: Resource>(record: &T, output: Output) -> Result<()> {
    match output {
        Output::Json => super::print_json(&record_json(record)?),
        Output::Table => {
            println!("ID:        {}", record.id().unwrap_or("-"));
            println!("Title:     {}", record.title());
            println!("Status:    {}", record.status());
            println!("Featured:  {}", if record.featured() { "yes" } else { "no" });
            if !folio_client::image::is_placeholder(record.image()) {
                println!("Image:     {}", truncate(record.image(), 72));
            }
            Ok(())
        }
    }
}

/// The backend may or may not echo the stored record back.
fn report<T: Resource>(verb: &str, record: Option<&T>, output: Output) -> Result<()> {
    println!("{} {verb}.", T::ENTITY);
    match record {
        Some(record) => print_record(record, output),
        None => Ok(()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
