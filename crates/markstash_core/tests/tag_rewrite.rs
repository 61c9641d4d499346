use markstash_core::db::open_db_in_memory;
use markstash_core::{
    BookmarkRepository, BookmarkService, RepoError, SqliteBookmarkRepository, TagRewriteOutcome,
    TagRewriter,
};
use rusqlite::Connection;

fn seed(conn: &mut Connection, tags: &[&str]) {
    let mut repo = SqliteBookmarkRepository::try_new(conn).unwrap();
    for (idx, tags) in tags.iter().enumerate() {
        repo.insert_bookmark(None, &format!("https://site{idx}.example"), "", tags)
            .unwrap();
    }
}

fn stored_tags(conn: &mut Connection) -> Vec<String> {
    let repo = SqliteBookmarkRepository::try_new(conn).unwrap();
    repo.list_bookmarks()
        .unwrap()
        .into_iter()
        .map(|bookmark| bookmark.tags)
        .collect()
}

#[test]
fn rename_touches_whole_tags_only() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",work,x,", ",homework,", ",x,work,"]);

    {
        let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        let outcome = TagRewriter::new(&mut repo)
            .replace_tag("work", Some(&["job"][..]))
            .unwrap();
        assert_eq!(outcome, TagRewriteOutcome::Rewritten { affected: 2 });
    }

    assert_eq!(stored_tags(&mut conn), vec![",job,x,", ",homework,", ",x,job,"]);
}

#[test]
fn rename_onto_existing_tag_drops_the_old_one() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",work, urgent, work,", ",work,"]);

    {
        let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        let outcome = TagRewriter::new(&mut repo)
            .replace_tag("work", Some(&["urgent"][..]))
            .unwrap();
        assert_eq!(outcome, TagRewriteOutcome::Rewritten { affected: 2 });
    }

    assert_eq!(stored_tags(&mut conn), vec![",urgent,", ",urgent,"]);
}

#[test]
fn rename_to_several_tags_splices_them_in() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",a,old,b,"]);

    {
        let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        TagRewriter::new(&mut repo)
            .replace_tag("old", Some(&["new,", "shiny", "thing"][..]))
            .unwrap();
    }

    assert_eq!(stored_tags(&mut conn), vec![",a,new,shiny thing,b,"]);
}

#[test]
fn delete_removes_tag_and_can_empty_the_set() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",work,", ",a,work,b,", ",other,"]);

    {
        let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        let outcome = TagRewriter::new(&mut repo).delete_tag("work").unwrap();
        assert_eq!(outcome, TagRewriteOutcome::Rewritten { affected: 2 });
    }

    assert_eq!(stored_tags(&mut conn), vec![",", ",a,b,", ",other,"]);
}

#[test]
fn empty_replacement_means_delete() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",work,keep,"]);

    {
        let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        TagRewriter::new(&mut repo)
            .replace_tag("work", Some(&[","][..]))
            .unwrap();
    }

    assert_eq!(stored_tags(&mut conn), vec![",keep,"]);
}

#[test]
fn identical_old_and_new_is_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",work,"]);

    let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
    let outcome = TagRewriter::new(&mut repo)
        .replace_tag(" work ", Some(&["work,"][..]))
        .unwrap();
    assert_eq!(outcome, TagRewriteOutcome::Unchanged);
}

#[test]
fn unknown_tag_affects_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",work,"]);

    {
        let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        let outcome = TagRewriter::new(&mut repo)
            .replace_tag("missing", Some(&["x"][..]))
            .unwrap();
        assert_eq!(outcome, TagRewriteOutcome::Rewritten { affected: 0 });
    }

    assert_eq!(stored_tags(&mut conn), vec![",work,"]);
}

#[test]
fn blank_old_tag_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();

    let err = TagRewriter::new(&mut repo).delete_tag(" , ").unwrap_err();
    assert!(matches!(err, RepoError::InvalidTag(_)));
}

#[test]
fn service_exposes_rewriter_over_its_repository() {
    let mut conn = open_db_in_memory().unwrap();
    seed(&mut conn, &[",rust,"]);

    {
        let repo = SqliteBookmarkRepository::try_new(&mut conn).unwrap();
        let mut service = BookmarkService::new(repo, |_url: &str| String::new());
        let outcome = service
            .tag_rewriter()
            .replace_tag("rust", Some(&["rustlang"][..]))
            .unwrap();
        assert_eq!(outcome, TagRewriteOutcome::Rewritten { affected: 1 });
    }

    assert_eq!(stored_tags(&mut conn), vec![",rustlang,"]);
}
