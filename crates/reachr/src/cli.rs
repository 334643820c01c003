//! Command implementations for the `reachr` binary.
//!
//! Each `run_*` function performs one operation through [`App`] and prints
//! the result to stdout.

use anyhow::Result;

use reachr_core::{Contact, ContactFilter, ContactPatch, NewContact, UserId, UserPreferences};

use crate::app::App;

pub async fn run_list(app: &App, user: &UserId, filter: &ContactFilter) -> Result<()> {
    let contacts = app.list_contacts(user, filter).await?;
    if contacts.is_empty() {
        println!("No contacts.");
        return Ok(());
    }
    for contact in &contacts {
        println!("{}", summary_line(contact));
    }
    println!();
    println!("{} contact(s)", contacts.len());
    Ok(())
}

pub async fn run_add(app: &App, user: &UserId, new: NewContact) -> Result<()> {
    let contact = app.create_contact(user, new).await?;
    println!("Created contact {}", contact.id);
    Ok(())
}

pub async fn run_get(app: &App, user: &UserId, id: &str) -> Result<()> {
    let contact = app.get_contact(user, id).await?;
    print_contact(&contact);
    Ok(())
}

pub async fn run_update(app: &App, user: &UserId, id: &str, patch: ContactPatch) -> Result<()> {
    let contact = app.update_contact(user, id, patch).await?;
    println!("Updated contact {}", contact.id);
    print_contact(&contact);
    Ok(())
}

pub async fn run_delete(app: &App, user: &UserId, id: &str) -> Result<()> {
    app.delete_contact(user, id).await?;
    println!("Deleted contact {}", id);
    Ok(())
}

pub async fn run_search(app: &App, user: &UserId, query: &str) -> Result<()> {
    let response = app.search(user, query).await?;
    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in response.results.iter().enumerate() {
        println!(
            "{}. [{:>3}] {}  ({})",
            i + 1,
            result.score,
            summary_line(&result.contact),
            result.match_reason
        );
    }
    println!();
    println!("top score: {}", response.top_score);
    Ok(())
}

pub async fn run_tags(app: &App, user: &UserId) -> Result<()> {
    let tags = app.get_tags(user).await?;
    if tags.is_empty() {
        println!("No tags.");
        return Ok(());
    }
    println!("{:<30} {:>5}  SOURCE", "TAG", "COUNT");
    for entry in &tags {
        let source = serde_json::to_value(entry.source)?;
        println!(
            "{:<30} {:>5}  {}",
            entry.tag,
            entry.count,
            source.as_str().unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn run_tag_add(app: &App, user: &UserId, tag: &str) -> Result<()> {
    let prefs = app.add_tag(user, tag).await?;
    println!("Custom tags: {}", prefs.custom_tags.join(", "));
    Ok(())
}

pub async fn run_tag_remove(app: &App, user: &UserId, tag: &str) -> Result<()> {
    let prefs = app.remove_tag(user, tag).await?;
    if prefs.custom_tags.is_empty() {
        println!("Custom tags: (none)");
    } else {
        println!("Custom tags: {}", prefs.custom_tags.join(", "));
    }
    Ok(())
}

pub async fn run_industry(app: &App, user: &UserId, industry: &str) -> Result<()> {
    let prefs = app.set_industry(user, industry).await?;
    println!("Industry set to {}", prefs.industry.as_deref().unwrap_or("-"));
    println!("Suggested tags: {}", prefs.suggested_tags.join(", "));
    Ok(())
}

pub async fn run_prefs(app: &App, user: &UserId) -> Result<()> {
    let prefs = app.get_preferences(user).await?;
    print_preferences(&prefs);
    Ok(())
}

pub async fn run_migrate(app: &App, user: &UserId) -> Result<()> {
    let report = app.migrate_contacts(user).await?;
    println!("migrated: {}", report.migrated);
    println!("total:    {}", report.total);
    Ok(())
}

pub fn run_industries(app: &App) {
    for industry in app.list_industries() {
        println!("{:<14} {}", industry.id, industry.display_name);
    }
}

pub async fn run_users(app: &App) -> Result<()> {
    let users = app.users().await?;
    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }
    for user in &users {
        let count = app.list_contacts(user, &ContactFilter::default()).await?.len();
        println!("{:<40} {:>5} contact(s)", user, count);
    }
    Ok(())
}

fn summary_line(contact: &Contact) -> String {
    let mut line = format!("{}  {}", contact.id, contact.name);
    if let Some(company) = &contact.company {
        line.push_str(&format!(" @ {}", company));
    }
    if !contact.tags.is_empty() {
        line.push_str(&format!(" [{}]", contact.tags.join(", ")));
    }
    line
}

fn print_contact(contact: &Contact) {
    println!("--- Contact ---");
    println!("id:               {}", contact.id);
    println!("name:             {}", contact.name);
    let optional = [
        ("email", &contact.email),
        ("phone", &contact.phone),
        ("company", &contact.company),
        ("role", &contact.role),
        ("industry", &contact.industry),
        ("location", &contact.location),
        ("linkedin_url", &contact.linkedin_url),
        ("met_date", &contact.met_date),
        ("meeting_location", &contact.meeting_location),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("{:<17} {}", format!("{}:", label), value);
        }
    }
    if !contact.tags.is_empty() {
        println!("tags:             {}", contact.tags.join(", "));
    }
    println!("priority:         {}", contact.priority);
    println!("created_at:       {}", contact.created_at);
    println!("updated_at:       {}", contact.updated_at);
    if let Some(notes) = &contact.raw_context {
        println!();
        println!("--- Notes ---");
        println!("{}", notes);
    }
}

fn print_preferences(prefs: &UserPreferences) {
    println!("industry:       {}", prefs.industry.as_deref().unwrap_or("-"));
    println!("custom_tags:    {}", prefs.custom_tags.join(", "));
    println!("suggested_tags: {}", prefs.suggested_tags.join(", "));
    if let Some(updated) = &prefs.updated_at {
        println!("updated_at:     {}", updated);
    }
}
