//! Operation-surface tests run against both storage backends.

use std::fs;

use reachr::app::App;
use reachr::config::{parse_config, Config};
use reachr_core::catalog;
use reachr_core::{
    ContactFilter, ContactPatch, Error, NewContact, PreferencesUpdate, TagSource, UserId,
};
use tempfile::TempDir;

fn files_config(tmp: &TempDir) -> Config {
    parse_config(&format!(
        "[storage]\nbackend = \"files\"\nroot = \"{}\"\n",
        tmp.path().join("data").display()
    ))
    .unwrap()
}

fn sqlite_config(tmp: &TempDir) -> Config {
    parse_config(&format!(
        "[storage]\nbackend = \"sqlite\"\npath = \"{}\"\n\n[search]\nquick_limit = 2\n",
        tmp.path().join("reachr.sqlite").display()
    ))
    .unwrap()
}

async fn both_backends() -> Vec<(TempDir, App)> {
    let mut out = Vec::new();
    for make in [files_config, sqlite_config] {
        let tmp = TempDir::new().unwrap();
        let app = App::open(&make(&tmp)).await.unwrap();
        out.push((tmp, app));
    }
    out
}

fn ada() -> UserId {
    UserId::Account("ada".into())
}

#[tokio::test]
async fn test_create_then_search_scenario() {
    for (_tmp, app) in both_backends().await {
        let user = ada();
        assert!(app
            .list_contacts(&user, &ContactFilter::default())
            .await
            .unwrap()
            .is_empty());

        let mut new = NewContact::named("Ada Lovelace");
        new.company = Some("Analytical Engines".into());
        let created = app.create_contact(&user, new).await.unwrap();
        assert!(!created.id.is_empty());

        let response = app.search(&user, "analytical").await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].contact.id, created.id);
        assert_eq!(response.results[0].score, 80);
        assert_eq!(response.results[0].match_reason, "company");
        assert_eq!(response.top_score, 80);
        assert_eq!(response.query, "analytical");
    }
}

#[tokio::test]
async fn test_crud_round_trip() {
    for (_tmp, app) in both_backends().await {
        let user = ada();
        let mut new = NewContact::named("Grace");
        new.phone = Some("555-0000".into());
        new.email = Some("grace@navy.mil".into());
        let created = app.create_contact(&user, new).await.unwrap();

        let patch: ContactPatch =
            serde_json::from_str(r#"{"phone": "555-0100", "email": null}"#).unwrap();
        let updated = app.update_contact(&user, &created.id, patch).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.email, None);
        assert_eq!(updated.name, "Grace");
        assert_eq!(updated.created_at, created.created_at);

        let fetched = app.get_contact(&user, &created.id).await.unwrap();
        assert_eq!(fetched, updated);

        app.delete_contact(&user, &created.id).await.unwrap();
        assert!(matches!(
            app.get_contact(&user, &created.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            app.delete_contact(&user, &created.id).await,
            Err(Error::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn test_list_filters() {
    for (_tmp, app) in both_backends().await {
        let user = ada();
        for (name, industry, location) in [
            ("A", "Finance", "Denver"),
            ("B", "finance", "Boston"),
            ("C", "Legal", "Denver"),
        ] {
            let mut new = NewContact::named(name);
            new.industry = Some(industry.into());
            new.location = Some(location.into());
            app.create_contact(&user, new).await.unwrap();
        }
        app.create_contact(&user, NewContact::named("D")).await.unwrap();

        let finance = app
            .list_contacts(
                &user,
                &ContactFilter {
                    industry: Some("FINANCE".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = finance.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let limited = app
            .list_contacts(
                &user,
                &ContactFilter {
                    location: Some("denver".into()),
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].name, "A");
    }
}

#[tokio::test]
async fn test_users_are_isolated() {
    for (_tmp, app) in both_backends().await {
        let bob = UserId::Account("bob".into());
        app.create_contact(&ada(), NewContact::named("Only Ada's"))
            .await
            .unwrap();
        assert!(app
            .list_contacts(&bob, &ContactFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(app.search(&bob, "ada").await.unwrap().results.is_empty());
    }
}

#[tokio::test]
async fn test_industry_suggestions_show_in_tags() {
    for (_tmp, app) in both_backends().await {
        let user = ada();
        app.set_industry(&user, "technology").await.unwrap();
        let tags = app.get_tags(&user).await.unwrap();

        for expected in catalog::resolve("technology").default_tags {
            let entry = tags
                .iter()
                .find(|t| t.tag == *expected)
                .unwrap_or_else(|| panic!("missing suggested tag {expected}"));
            assert_eq!(entry.count, 0);
            assert_eq!(entry.source, TagSource::Suggested);
        }
    }
}

#[tokio::test]
async fn test_custom_tag_counts_contact_usage() {
    for (_tmp, app) in both_backends().await {
        let user = ada();
        app.add_tag(&user, "Investor").await.unwrap();
        let mut new = NewContact::named("Val");
        new.tags = vec!["investor".into(), "vc".into()];
        app.create_contact(&user, new).await.unwrap();

        let tags = app.get_tags(&user).await.unwrap();
        let investor: Vec<_> = tags.iter().filter(|t| t.tag == "investor").collect();
        assert_eq!(investor.len(), 1);
        assert_eq!(investor[0].source, TagSource::Custom);
        assert_eq!(investor[0].count, 1);

        let prefs = app.remove_tag(&user, "INVESTOR").await.unwrap();
        assert!(prefs.custom_tags.is_empty());
        app.remove_tag(&user, "investor").await.unwrap();
    }
}

#[tokio::test]
async fn test_set_preferences_single_update() {
    for (_tmp, app) in both_backends().await {
        let user = ada();
        let prefs = app
            .set_preferences(
                &user,
                PreferencesUpdate {
                    industry: Some("Real Estate".into()),
                    custom_tags: Some(vec!["Flipper".into()]),
                },
            )
            .await
            .unwrap();
        assert_eq!(prefs.industry.as_deref(), Some("real_estate"));
        assert_eq!(prefs.custom_tags, vec!["flipper"]);
        assert_eq!(app.get_preferences(&user).await.unwrap(), prefs);
    }
}

#[tokio::test]
async fn test_quick_search_caps_results() {
    let tmp = TempDir::new().unwrap();
    let app = App::open(&sqlite_config(&tmp)).await.unwrap();
    for name in ["Sam One", "Sam Two", "Sam Three"] {
        app.create_contact(&ada(), NewContact::named(name))
            .await
            .unwrap();
    }

    let quick = app.quick_search(&ada(), "sam").await.unwrap();
    assert_eq!(quick.results.len(), 2);
    assert_eq!(quick.explanation, "Found 2 contacts matching 'sam'");
}

#[tokio::test]
async fn test_migration_from_legacy_file() {
    let tmp = TempDir::new().unwrap();
    let cfg = files_config(&tmp);
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("contacts.json"),
        r#"{"contacts": [
            {"id": "1", "name": "Legacy One", "user_id": "anonymous",
             "created_at": "2023-01-01T00:00:00", "updated_at": "2023-01-01T00:00:00"},
            {"id": "2", "name": "Legacy Two", "tags": null, "extra": true}
        ]}"#,
    )
    .unwrap();

    let app = App::open(&cfg).await.unwrap();
    let first = app.migrate_contacts(&ada()).await.unwrap();
    assert_eq!((first.migrated, first.total), (2, 2));

    let second = app.migrate_contacts(&ada()).await.unwrap();
    assert_eq!((second.migrated, second.total), (0, 2));

    let mine = app
        .list_contacts(&ada(), &ContactFilter::default())
        .await
        .unwrap();
    assert!(mine.iter().all(|c| c.owner_id.as_deref() == Some("ada")));
    assert_eq!(mine[0].created_at, "2023-01-01T00:00:00");

    // The legacy collection itself is left alone.
    let shared = app
        .list_contacts(&UserId::Anonymous, &ContactFilter::default())
        .await
        .unwrap();
    assert_eq!(shared.len(), 2);

    let users = app.users().await.unwrap();
    assert_eq!(users, vec![UserId::Anonymous, ada()]);
}

#[tokio::test]
async fn test_corrupt_file_is_kept_and_good_entries_survive() {
    let tmp = TempDir::new().unwrap();
    let cfg = files_config(&tmp);
    let dir = tmp.path().join("data").join("users").join("ada");
    fs::create_dir_all(&dir).unwrap();
    let raw = r#"{"contacts": [{"id": "a", "name": "Keep Me"}, {"id": 7, "name": "Bad"}]}"#;
    fs::write(dir.join("contacts.json"), raw).unwrap();

    let app = App::open(&cfg).await.unwrap();
    let listed = app
        .list_contacts(&ada(), &ContactFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Keep Me");

    app.create_contact(&ada(), NewContact::named("New"))
        .await
        .unwrap();
    let names: Vec<String> = app
        .list_contacts(&ada(), &ContactFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Keep Me", "New"]);

    let kept: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("contacts.json.corrupt-")
        })
        .collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(fs::read_to_string(&kept[0]).unwrap(), raw);
}

#[tokio::test]
async fn test_unparseable_sqlite_document_is_kept() {
    let tmp = TempDir::new().unwrap();
    let cfg = sqlite_config(&tmp);
    let app = App::open(&cfg).await.unwrap();
    app.create_contact(&ada(), NewContact::named("Before"))
        .await
        .unwrap();

    let pool = reachr::db::connect(&cfg.sqlite_path()).await.unwrap();
    sqlx::query("UPDATE documents SET body = '{ not json' WHERE namespace = 'user:ada'")
        .execute(&pool)
        .await
        .unwrap();

    assert!(app
        .list_contacts(&ada(), &ContactFilter::default())
        .await
        .unwrap()
        .is_empty());
    app.create_contact(&ada(), NewContact::named("After"))
        .await
        .unwrap();

    let kept: Vec<String> =
        sqlx::query_scalar("SELECT body FROM quarantine WHERE namespace = 'user:ada'")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(kept, vec!["{ not json".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separately_opened_apps_do_not_lose_writes() {
    for make in [files_config, sqlite_config] {
        let tmp = TempDir::new().unwrap();
        let cfg = make(&tmp);
        let first = App::open(&cfg).await.unwrap();
        let second = App::open(&cfg).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..40 {
            let app = if i % 2 == 0 { first.clone() } else { second.clone() };
            handles.push(tokio::spawn(async move {
                app.create_contact(&ada(), NewContact::named(format!("C{i}")))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let all = first
            .list_contacts(&ada(), &ContactFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 40);

        let (ada_one, ada_two) = (ada(), ada());
        let (one, two) = tokio::join!(first.add_tag(&ada_one, "one"), second.add_tag(&ada_two, "two"));
        one.unwrap();
        two.unwrap();
        let custom = second.get_preferences(&ada()).await.unwrap().custom_tags;
        assert_eq!(custom.len(), 2);
    }
}

#[tokio::test]
async fn test_concurrent_creates_across_clones() {
    let tmp = TempDir::new().unwrap();
    let app = App::open(&files_config(&tmp)).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.create_contact(&ada(), NewContact::named(format!("C{i}")))
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let all = app
        .list_contacts(&ada(), &ContactFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 20);
}

#[tokio::test]
async fn test_industries_catalog_order() {
    let tmp = TempDir::new().unwrap();
    let app = App::open(&files_config(&tmp)).await.unwrap();
    let ids: Vec<&str> = app.list_industries().iter().map(|i| i.id).collect();
    assert_eq!(ids.first(), Some(&"real_estate"));
    assert_eq!(ids.last(), Some(&"general"));
    assert_eq!(ids.len(), 9);
}
