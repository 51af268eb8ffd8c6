mod common;

use std::cell::RefCell;

use chrono::NaiveDate;
use reptool::{Error, FixedDocument, InputDocument, Paginator, Report, SectionKind, TableModel};

fn listing(rows: usize) -> Report {
    let mut report = Report::from_xml(common::LISTING).unwrap();
    report.set_table_model(common::people(rows));
    report
}

#[test]
fn six_rows_fit_between_header_and_footer() {
    common::init_logging();
    let doc = listing(13).paginate().unwrap();
    assert_eq!(doc.page_count(), 3);

    let first = common::texts(&doc.pages[0]);
    assert_eq!(first.first().map(String::as_str), Some("Listing p.1"));
    assert_eq!(first.last().map(String::as_str), Some("1/3"));
    // header + 6 rows of two cells + footer
    assert_eq!(first.len(), 14);

    assert_eq!(
        common::texts(&doc.pages[2]),
        ["Listing p.3", "person13", "city13", "3/3"]
    );
}

#[test]
fn rows_and_footer_positions() {
    let doc = listing(6).paginate().unwrap();
    assert_eq!(doc.page_count(), 1);
    let page = &doc.pages[0];
    // header, then rows every 40pt starting below it
    assert_eq!(common::attr_f64(page, 0, "y"), 0.0);
    assert_eq!(common::attr_f64(page, 1, "y"), 20.0);
    assert_eq!(common::attr_f64(page, 2, "x"), 100.0);
    assert_eq!(common::attr_f64(page, 11, "y"), 220.0);
    // footer sits on the bottom edge
    assert_eq!(common::attr_f64(page, 13, "y"), 280.0);
}

#[test]
fn json_rows_drive_the_listing() {
    let table = TableModel::from_json(
        r#"[{"name": "Ada", "city": "London"}, {"name": "Linus", "city": null}]"#,
    )
    .unwrap();
    let mut report = listing(0);
    report.set_table_model(table);
    let doc = report.paginate().unwrap();
    assert_eq!(
        common::texts(&doc.pages[0]),
        ["Listing p.1", "Ada", "London", "Linus", "", "1/1"]
    );
}

#[test]
fn sql_rows_come_from_the_registered_provider() {
    let mut report = listing(0);
    report.set_database("memory", "people.db", "SELECT name, city FROM people");

    let seen = RefCell::new(Vec::new());
    let doc = Paginator::new(&report)
        .with_sql_provider("memory", |conn: &str, sql: &str| -> Result<TableModel, Error> {
            seen.borrow_mut().push(format!("{conn}: {sql}"));
            Ok(common::people(7))
        })
        .run()
        .unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(seen.into_inner(), ["people.db: SELECT name, city FROM people"]);

    let failing = Paginator::new(&report)
        .with_sql_provider("memory", |_: &str, _: &str| -> Result<TableModel, Error> {
            Err(Error::Database("no such table".into()))
        })
        .run();
    assert!(matches!(failing, Err(Error::Database(_))));
}

#[test]
fn field_request_fills_computed_columns() {
    let mut report = listing(2);
    let xml = report.to_xml().unwrap().replace(r#"source="city""#, r#"source="initial""#);
    report = Report::from_xml(&xml).unwrap();
    report.set_table_model(common::people(2));

    let doc = Paginator::new(&report)
        .on_field_request(|name, _| (name == "initial").then(|| "P".to_string()))
        .run()
        .unwrap();
    assert_eq!(
        common::texts(&doc.pages[0]),
        ["Listing p.1", "person1", "P", "person2", "P", "1/1"]
    );
}

#[test]
fn date_tokens_use_the_run_timestamp() {
    let mut report = listing(1);
    let header = report
        .object_by_name_mut("heading")
        .and_then(|o| match o {
            reptool::ReportObject::Text(t) => Some(t),
            _ => None,
        })
        .unwrap();
    header.source = Some(r#"@Date{%d.%m.%Y}"#.to_string());

    let now = NaiveDate::from_ymd_opt(2025, 12, 31)
        .unwrap()
        .and_hms_opt(23, 0, 0)
        .unwrap();
    let doc = Paginator::new(&report).with_timestamp(now).run().unwrap();
    assert_eq!(common::texts(&doc.pages[0])[0], "31.12.2025");
}

#[test]
fn page_header_can_skip_the_first_page() {
    let mut report = listing(13);
    report.section_mut(SectionKind::PageHeader).first_page = false;
    let doc = report.paginate().unwrap();
    assert!(!common::texts(&doc.pages[0]).contains(&"Listing p.1".to_string()));
    assert_eq!(common::texts(&doc.pages[1])[0], "Listing p.2");
}

#[test]
fn fixed_layout_survives_a_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listing.xml");
    let doc = listing(8).paginate().unwrap();
    doc.save(&path).unwrap();

    let reloaded = FixedDocument::from_file(&path).unwrap();
    assert_eq!(reloaded.page_count(), 2);
    for (a, b) in doc.pages.iter().zip(&reloaded.pages) {
        assert_eq!(common::texts(a), common::texts(b));
        assert_eq!(a.size, b.size);
    }

    match InputDocument::from_file(&path).unwrap() {
        InputDocument::Fixed(fixed) => assert_eq!(fixed.page_count(), 2),
        InputDocument::Report(_) => panic!("fixed layout read as a report"),
    }
}

#[test]
fn report_input_is_paginated_on_demand() {
    let input = InputDocument::from_xml(common::LISTING).unwrap();
    assert!(matches!(input, InputDocument::Report(_)));
    // no data source: every section once on a single page
    let doc = input.into_fixed().unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(
        common::texts(&doc.pages[0]),
        ["Listing p.1", "{ERROR}", "{ERROR}", "1/1"]
    );
}
