//! Line-based interactive prompts.
//!
//! Prompts write to the given output (stderr in production) so that record
//! output on stdout stays pipeable.

use std::io::{BufRead, Write};

use markstash_core::SearchHit;

/// Asks a yes/no question; only `y` or `yes` (any case) confirms.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> std::io::Result<bool> {
    write!(output, "{question} (y/N): ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Reads a password from the terminal with echo disabled, labelled on stderr.
pub fn read_password(label: &str) -> std::io::Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;
    rpassword::read_password()
}

/// Asks for a new password twice through `read`.
///
/// Returns `None` when the two entries differ.
pub fn new_password<F>(mut read: F) -> std::io::Result<Option<String>>
where
    F: FnMut(&str) -> std::io::Result<String>,
{
    let first = read("Password")?;
    let again = read("Password (again)")?;
    Ok((first == again).then_some(first))
}

/// Repeatedly asks for a result number and hands its url to `open`.
///
/// EOF or an empty line ends the loop. Returns how many results were opened.
pub fn open_results<R, W, F>(
    input: &mut R,
    output: &mut W,
    hits: &[SearchHit],
    mut open: F,
) -> std::io::Result<usize>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> std::io::Result<()>,
{
    let mut opened = 0;
    loop {
        write!(output, "open result (1-{}, Enter to quit): ", hits.len())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let choice = line.trim();
        if choice.is_empty() {
            break;
        }

        match choice
            .parse::<usize>()
            .ok()
            .and_then(|rank| rank.checked_sub(1))
            .and_then(|idx| hits.get(idx))
        {
            Some(hit) => match open(&hit.bookmark.url) {
                Ok(()) => opened += 1,
                Err(err) => writeln!(output, "could not open {}: {err}", hit.bookmark.url)?,
            },
            None => writeln!(output, "no result `{choice}`")?,
        }
    }
    Ok(opened)
}

#[cfg(test)]
mod tests {
    use super::{confirm, new_password, open_results};
    use markstash_core::{Bookmark, SearchHit};
    use std::io::Cursor;

    fn hit(rank: usize, url: &str) -> SearchHit {
        SearchHit {
            rank,
            bookmark: Bookmark {
                id: rank as u32 + 10,
                url: url.into(),
                title: String::new(),
                tags: ",".into(),
            },
        }
    }

    #[test]
    fn confirm_accepts_only_explicit_yes() {
        let mut sink = Vec::new();
        assert!(confirm(&mut Cursor::new("Y\n"), &mut sink, "Delete?").unwrap());
        assert!(confirm(&mut Cursor::new(" yes \n"), &mut sink, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new("\n"), &mut sink, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new("no\n"), &mut sink, "Delete?").unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut sink, "Delete?").unwrap());
    }

    #[test]
    fn new_password_requires_matching_entries() {
        let mut labels = Vec::new();
        let mut entries = vec!["s3cret", "s3cret"].into_iter();
        let password = new_password(|label| {
            labels.push(label.to_string());
            Ok(entries.next().unwrap().to_string())
        })
        .unwrap();
        assert_eq!(password.as_deref(), Some("s3cret"));
        assert_eq!(labels, vec!["Password", "Password (again)"]);

        let mut entries = vec!["s3cret", "typo"].into_iter();
        let mismatch = new_password(|_| Ok(entries.next().unwrap().to_string())).unwrap();
        assert_eq!(mismatch, None);
    }

    #[test]
    fn open_loop_opens_by_rank_and_stops_on_empty_line() {
        let hits = vec![hit(1, "https://a.example"), hit(2, "https://b.example")];
        let mut opened = Vec::new();
        let mut sink = Vec::new();

        let count = open_results(&mut Cursor::new("2\n7\nx\n1\n\n2\n"), &mut sink, &hits, |url| {
            opened.push(url.to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(opened, vec!["https://b.example", "https://a.example"]);
        let transcript = String::from_utf8(sink).unwrap();
        assert!(transcript.contains("no result `7`"));
        assert!(transcript.contains("no result `x`"));
    }

    #[test]
    fn open_loop_ends_on_eof() {
        let hits = vec![hit(1, "https://a.example")];
        let mut sink = Vec::new();
        let count = open_results(&mut Cursor::new("1"), &mut sink, &hits, |_| Ok(())).unwrap();
        assert_eq!(count, 1);
    }
}
