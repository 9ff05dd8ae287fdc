use std::fs;

use personal_library_manager::transfer::{export_csv, parse_csv};
use personal_library_manager::{dispatch, Action, Library, LibraryError, NewBook, Outcome};
use tempfile::TempDir;

fn open_temp_library(dir: &TempDir, name: &str) -> Library {
    Library::open(dir.path().join(name)).unwrap()
}

fn add(library: &Library, title: &str, author: &str, year: &str, genre: &str, read: bool) -> i64 {
    let book = NewBook::parse(title, author, year, genre, read).unwrap();
    match dispatch(library, Action::Add(book)).unwrap() {
        Outcome::Created(id) => id,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn dune_and_emma_scenario() {
    let dir = TempDir::new().unwrap();
    let library = open_temp_library(&dir, "library.sqlite");

    assert_eq!(add(&library, "Dune", "Herbert", "1965", "Sci-Fi", false), 1);
    assert_eq!(add(&library, "Emma", "Austen", "1815", "Romance", true), 2);

    let stats = library.statistics().unwrap();
    assert_eq!((stats.total, stats.read, stats.read_percentage), (2, 1, 50.0));

    let found = library.search("en").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].author, "Austen");

    let malformed = dir.path().join("no_author.csv");
    fs::write(
        &malformed,
        "ID,Title,Year,Genre,Read Status\n1,Persuasion,1817,Romance,0\n",
    )
    .unwrap();
    let err = dispatch(&library, Action::Import(malformed)).unwrap_err();
    assert!(matches!(err, LibraryError::MalformedRow { .. }));
    assert_eq!(library.fetch_all().unwrap().len(), 2);
}

#[test]
fn import_of_export_reproduces_records_in_empty_store() {
    let dir = TempDir::new().unwrap();
    let source = open_temp_library(&dir, "source.sqlite");
    add(&source, "Dune", "Herbert", "1965", "Sci-Fi", false);
    add(&source, "Emma", "Austen", "1815", "Romance", true);
    add(&source, "War, and \"Peace\"", "Tolstoy", "1869", "", true);
    source.delete(1).unwrap();
    add(&source, "Ulysses", "Joyce", "1922", "Modernist\nNovel", false);

    let path = dir.path().join("library.csv");
    dispatch(&source, Action::Export(path.clone())).unwrap();

    let target = open_temp_library(&dir, "target.sqlite");
    match dispatch(&target, Action::Import(path)).unwrap() {
        Outcome::Imported { count, .. } => assert_eq!(count, 3),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let original: Vec<NewBook> = source
        .fetch_all()
        .unwrap()
        .iter()
        .map(|b| b.to_new_book())
        .collect();
    let imported: Vec<NewBook> = target
        .fetch_all()
        .unwrap()
        .iter()
        .map(|b| b.to_new_book())
        .collect();
    assert_eq!(imported, original);
}

#[test]
fn bad_row_rejects_whole_import() {
    let dir = TempDir::new().unwrap();
    let library = open_temp_library(&dir, "library.sqlite");

    let path = dir.path().join("partial.csv");
    fs::write(
        &path,
        "Title,Author,Year,Genre,Read Status\n\
         Dune,Herbert,1965,Sci-Fi,0\n\
         Emma,Austen,eighteen,Romance,1\n",
    )
    .unwrap();

    let err = dispatch(&library, Action::Import(path)).unwrap_err();
    match err {
        LibraryError::MalformedRow { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(library.fetch_all().unwrap().is_empty());
}

#[test]
fn export_writes_header_for_empty_library() {
    let dir = TempDir::new().unwrap();
    let library = open_temp_library(&dir, "library.sqlite");
    let path = dir.path().join("empty.csv");

    match dispatch(&library, Action::Export(path.clone())).unwrap() {
        Outcome::Exported { count, .. } => assert_eq!(count, 0),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "ID,Title,Author,Year,Genre,Read Status\n"
    );
}

#[test]
fn export_to_missing_directory_reports_io() {
    let dir = TempDir::new().unwrap();
    let library = open_temp_library(&dir, "library.sqlite");
    let err = dispatch(
        &library,
        Action::Export(dir.path().join("missing").join("out.csv")),
    )
    .unwrap_err();
    assert!(matches!(err, LibraryError::Io { .. }));
}

#[test]
fn codec_round_trip_without_store() {
    let dir = TempDir::new().unwrap();
    let library = open_temp_library(&dir, "library.sqlite");
    add(&library, "Beloved", "Morrison", "1987", "Fiction", true);

    let books = library.fetch_all().unwrap();
    let parsed = parse_csv(&export_csv(&books)).unwrap();
    assert_eq!(parsed, vec![books[0].to_new_book()]);
}
