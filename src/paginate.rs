//! Pagination: walks the bound rows and lays the five sections out onto
//! fixed pages.
//!
//! Per row the Body is emitted at the running vertical cursor. A new page is
//! opened when the Body asked for one after the previous row, or when the
//! next Body would run into the page footer (or the bottom margin if there is
//! no footer). Page footers of closed pages are evaluated with the row that
//! was current when the page closed. `@Pages` is resolved in a final sweep
//! once the page count is known.

use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

use chrono::NaiveDateTime;

use crate::common::fmt_num;
use crate::data::{DataContext, DataSource, RowCursor, SqlProvider, SqlSource, TableModel};
use crate::error::Error;
use crate::fixed::{FixedDocument, FixedPage};
use crate::node::Node;
use crate::object::ReportObject;
use crate::report::{Report, Section, SectionKind};
use crate::template::{self, EvalContext, PAGES_MARKER};

const EPSILON: f64 = 1e-6;

/// Called for field names the bound data cannot resolve.
pub type FieldHandler<'a> = Box<dyn FnMut(&str, &DataContext<'_>) -> Option<String> + 'a>;

/// One pagination run over a report. Configure with the builder methods,
/// then consume with [`Paginator::run`].
pub struct Paginator<'a> {
    report: &'a Report,
    providers: HashMap<String, Box<dyn SqlProvider + 'a>>,
    field_request: Option<FieldHandler<'a>>,
    now: Option<NaiveDateTime>,
}

impl<'a> Paginator<'a> {
    pub fn new(report: &'a Report) -> Self {
        Paginator {
            report,
            providers: HashMap::new(),
            field_request: None,
            now: None,
        }
    }

    /// Register the executor for `<database><provider>id</provider>`.
    pub fn with_sql_provider(mut self, id: &str, provider: impl SqlProvider + 'a) -> Self {
        self.providers.insert(id.to_string(), Box::new(provider));
        self
    }

    pub fn on_field_request(
        mut self,
        handler: impl FnMut(&str, &DataContext<'_>) -> Option<String> + 'a,
    ) -> Self {
        self.field_request = Some(Box::new(handler));
        self
    }

    /// Fix the instant `@Date`/`@Time` render. Defaults to local now.
    pub fn with_timestamp(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn run(self) -> Result<FixedDocument, Error> {
        let t0 = Instant::now();
        let report = self.report;

        let sql_rows: TableModel;
        let cursor = match report.data_source() {
            None => None,
            Some(DataSource::Sql(sql)) => {
                sql_rows = query(&self.providers, sql)?;
                Some(RowCursor::over_table(&sql_rows))
            }
            Some(DataSource::Table(model)) => Some(RowCursor::over_table(model)),
            Some(DataSource::Tree(source)) => Some(RowCursor::over_tree(source)),
        };

        let mut layout = Layout {
            report,
            doc: FixedDocument::new(report.properties.clone()),
            cur_y: 0.0,
            page_has_flow: false,
            header_ranges: Vec::new(),
            now: self
                .now
                .unwrap_or_else(|| chrono::Local::now().naive_local()),
            field_request: self.field_request,
        };

        let rows = match cursor {
            Some(mut cursor) => layout.run_rows(&mut cursor),
            None => {
                layout.run_single_pass();
                0
            }
        };

        let mut doc = layout.doc;
        let total = doc.page_count().to_string();
        let swept = doc.replace_text(PAGES_MARKER, &total);
        log::debug!("Resolved @Pages in {swept} text objects");

        log::info!(
            "Paginated {rows} rows into {} pages in {:.1}ms",
            doc.page_count(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(doc)
    }
}

impl Report {
    /// Paginate with default settings: no SQL providers, no field handler.
    pub fn paginate(&self) -> Result<FixedDocument, Error> {
        Paginator::new(self).run()
    }
}

fn query(
    providers: &HashMap<String, Box<dyn SqlProvider + '_>>,
    sql: &SqlSource,
) -> Result<TableModel, Error> {
    let provider = providers.get(&sql.provider).ok_or_else(|| {
        log::error!("No SQL provider registered for \"{}\"", sql.provider);
        Error::Database(format!("no provider registered for \"{}\"", sql.provider))
    })?;
    provider
        .execute(&sql.connection_string, &sql.sql)
        .inspect_err(|e| log::error!("Query failed, pagination aborted: {e}"))
}

struct Layout<'r, 'h> {
    report: &'r Report,
    doc: FixedDocument,
    cur_y: f64,
    /// Anything besides the page header was placed on the current page.
    page_has_flow: bool,
    /// Node range of the page header on each page, if one was emitted.
    header_ranges: Vec<Option<Range<usize>>>,
    now: NaiveDateTime,
    field_request: Option<FieldHandler<'h>>,
}

impl<'r> Layout<'r, '_> {
    fn section(&self, kind: SectionKind) -> Option<&'r Section> {
        self.report.section(kind)
    }

    fn page_number(&self) -> usize {
        self.doc.pages.len()
    }

    fn bottom_limit(&self) -> f64 {
        self.report.page.size.height - self.report.page.margin.bottom
    }

    fn footer_height(&self) -> f64 {
        self.section(SectionKind::PageFooter).map_or(0.0, |s| s.height)
    }

    fn fits(&self, height: f64) -> bool {
        let bottom = self.bottom_limit();
        self.cur_y + height <= bottom - self.footer_height() + EPSILON
            && self.cur_y <= bottom + EPSILON
    }

    fn run_rows(&mut self, cursor: &mut RowCursor<'_>) -> usize {
        let report = self.report;
        let body = report.body();
        let mut has_row = cursor.advance();

        self.start_page(Some(&*cursor));
        self.emit_report_header(Some(&*cursor));

        if has_row && self.page_has_flow && !self.fits(body.height) {
            let footer = self.build_page_footer(Some(&*cursor));
            self.break_page(footer, Some(&*cursor));
        }

        let mut rows = 0;
        while has_row {
            self.emit_flow(SectionKind::Body, Some(&*cursor));
            rows += 1;

            let needs_break = body.new_page_after || !self.fits(body.height);
            let footer = needs_break.then(|| self.build_page_footer(Some(&*cursor)));
            has_row = cursor.advance();
            if has_row && let Some(footer) = footer {
                self.break_page(footer, Some(&*cursor));
            }
        }

        if let Some(report_footer) = report.section(SectionKind::ReportFooter) {
            let explicit = report_footer.new_page_before || (rows > 0 && body.new_page_after);
            if self.page_has_flow && (explicit || !self.fits(report_footer.height)) {
                let footer = self.build_page_footer(Some(&*cursor));
                self.break_page(footer, Some(&*cursor));
            }
            self.emit_flow(SectionKind::ReportFooter, Some(&*cursor));
        }

        self.finish_last_page(Some(&*cursor));
        rows
    }

    /// Without a data source every section is placed exactly once on a
    /// single page.
    fn run_single_pass(&mut self) {
        self.open_page();
        if let Some(header) = self.section(SectionKind::PageHeader) {
            let height = header.height;
            let start = self.current_page_len();
            self.emit_at(SectionKind::PageHeader, self.cur_y, None);
            self.cur_y += height;
            self.header_ranges[0] = Some(start..self.current_page_len());
        }
        for kind in [
            SectionKind::ReportHeader,
            SectionKind::Body,
            SectionKind::ReportFooter,
        ] {
            if self.section(kind).is_some() {
                self.emit_flow(kind, None);
            }
        }
        if self.section(SectionKind::PageFooter).is_some() {
            let y = self.bottom_limit() - self.footer_height();
            self.emit_at(SectionKind::PageFooter, y, None);
        }
    }

    fn open_page(&mut self) {
        self.doc.pages.push(FixedPage::new(&self.report.page));
        self.header_ranges.push(None);
        self.cur_y = self.report.page.margin.top;
        self.page_has_flow = false;
    }

    fn current_page_len(&self) -> usize {
        self.doc.pages.last().map_or(0, |p| p.nodes.len())
    }

    fn start_page(&mut self, cursor: Option<&RowCursor<'_>>) {
        self.open_page();
        let Some(header) = self.section(SectionKind::PageHeader) else {
            return;
        };
        if self.page_number() == 1 && !header.first_page {
            log::debug!("Page header suppressed on the first page");
            return;
        }
        let height = header.height;
        let start = self.current_page_len();
        self.emit_at(SectionKind::PageHeader, self.cur_y, cursor);
        self.cur_y += height;
        let end = self.current_page_len();
        if let Some(range) = self.header_ranges.last_mut() {
            *range = Some(start..end);
        }
    }

    fn emit_report_header(&mut self, cursor: Option<&RowCursor<'_>>) {
        let Some(header) = self.section(SectionKind::ReportHeader) else {
            return;
        };
        let new_page_after = header.new_page_after;
        self.emit_flow(SectionKind::ReportHeader, cursor);
        // the page after the report header is an ordinary page: top margin
        // and page header included
        if new_page_after {
            let footer = self.build_page_footer(cursor);
            self.break_page(footer, cursor);
        }
    }

    /// Page-footer nodes for the current page, or `None` when this page
    /// must not carry one.
    fn build_page_footer(&mut self, cursor: Option<&RowCursor<'_>>) -> Option<Vec<Node>> {
        let footer = self.section(SectionKind::PageFooter)?;
        if self.page_number() == 1 && !footer.first_page {
            return None;
        }
        let y = self.bottom_limit() - footer.height;
        Some(self.build_section(SectionKind::PageFooter, y, cursor))
    }

    fn break_page(&mut self, footer: Option<Vec<Node>>, cursor: Option<&RowCursor<'_>>) {
        if let Some(nodes) = footer {
            self.commit(nodes);
        }
        self.start_page(cursor);
    }

    fn finish_last_page(&mut self, cursor: Option<&RowCursor<'_>>) {
        if let Some(header) = self.section(SectionKind::PageHeader)
            && !header.last_page
            && let Some(range) = self.header_ranges.last_mut().and_then(Option::take)
            && let Some(page) = self.doc.pages.last_mut()
        {
            page.nodes.drain(range);
        }

        if let Some(footer) = self.section(SectionKind::PageFooter)
            && footer.last_page
        {
            let y = self.bottom_limit() - footer.height;
            self.emit_at(SectionKind::PageFooter, y, cursor);
        }
    }

    /// Emit a section at the cursor and move the cursor below it.
    fn emit_flow(&mut self, kind: SectionKind, cursor: Option<&RowCursor<'_>>) {
        let height = self.section(kind).map_or(0.0, |s| s.height);
        self.emit_at(kind, self.cur_y, cursor);
        self.cur_y += height;
        self.page_has_flow = true;
    }

    fn emit_at(&mut self, kind: SectionKind, y: f64, cursor: Option<&RowCursor<'_>>) {
        let nodes = self.build_section(kind, y, cursor);
        self.commit(nodes);
    }

    fn commit(&mut self, nodes: Vec<Node>) {
        if let Some(page) = self.doc.pages.last_mut() {
            page.nodes.extend(nodes);
        }
    }

    fn build_section(
        &mut self,
        kind: SectionKind,
        y: f64,
        cursor: Option<&RowCursor<'_>>,
    ) -> Vec<Node> {
        let report = self.report;
        let Some(section) = report.section(kind) else {
            return Vec::new();
        };
        section
            .objects()
            .iter()
            .filter_map(|object| self.place(object, y, cursor))
            .collect()
    }

    /// The absolute, resolved node for one object, or `None` if it has no
    /// size. Hidden objects keep `visible="n"` and are skipped when drawn.
    fn place(
        &mut self,
        object: &ReportObject,
        y_offset: f64,
        cursor: Option<&RowCursor<'_>>,
    ) -> Option<Node> {
        if object.size().is_none() {
            log::warn!("Object \"{}\" has no size; not emitted", object.name());
            return None;
        }

        let mut node = object.to_node();
        node.remove_attr("name");

        let position = object.position();
        let left = self.report.page.margin.left;
        let x = if left != 0.0 {
            position.x + left
        } else {
            position.x
        };
        node.set_attr("x", fmt_num(x));
        node.set_attr("y", fmt_num(position.y + y_offset));

        if matches!(object, ReportObject::Text(_))
            && let Some(source) = node.remove_attr("source")
        {
            node.text = Some(self.resolve(&source, cursor));
        }
        Some(node)
    }

    fn resolve(&mut self, source: &str, cursor: Option<&RowCursor<'_>>) -> String {
        let ctx = EvalContext {
            page: self.page_number(),
            now: self.now,
        };
        let data = cursor.map_or(DataContext::None, RowCursor::context);
        let handler = &mut self.field_request;
        template::evaluate(source, &ctx, &mut |name| {
            cursor
                .and_then(|c| c.field(name))
                .or_else(|| handler.as_mut().and_then(|h| h(name, &data)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Margin, Point, Size, Unit};
    use crate::object::TextObject;
    use std::sync::Arc;

    fn text(name: &str, y: f64, height: f64, source: &str) -> ReportObject {
        let mut t = TextObject::new(name, Point::new(0.0, y)).unwrap();
        t.size = Some(Size::new(100.0, height));
        t.source = Some(source.to_string());
        ReportObject::Text(t)
    }

    fn rows(n: usize) -> TableModel {
        let mut model = TableModel::new(["name"]);
        for i in 1..=n {
            model.push_row([format!("row{i}")]);
        }
        model
    }

    fn report(page_height: f64, body_height: f64, n: usize) -> Report {
        let mut report = Report::new();
        report.set_page_size(Size::new(210.0, page_height));
        report.set_section_height(SectionKind::Body, body_height);
        report.add_object(SectionKind::Body, text("cell", 0.0, body_height, "name"));
        report.set_table_model(rows(n));
        report
    }

    fn texts(page: &FixedPage) -> Vec<String> {
        page.nodes
            .iter()
            .filter_map(|n| n.text.clone())
            .collect()
    }

    fn ys(page: &FixedPage) -> Vec<f64> {
        page.nodes
            .iter()
            .filter_map(|n| n.attr("y")?.parse().ok())
            .collect()
    }

    #[test]
    fn seven_rows_on_a4_make_two_pages() {
        let mut report = report(297.0, 50.0, 7);
        report.set_unit(Unit::Millimetres);
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(ys(&doc.pages[0]), [0.0, 50.0, 100.0, 150.0, 200.0]);
        assert_eq!(ys(&doc.pages[1]), [0.0, 50.0]);
        assert_eq!(texts(&doc.pages[1]), ["row6", "row7"]);
    }

    #[test]
    fn page_count_at_the_boundary() {
        // usable height 300
        for (body, n, pages) in [
            (50.0, 6, 1),
            (50.0, 7, 2),
            (50.0, 12, 2),
            (50.0, 13, 3),
            (51.0, 6, 2),
            (49.0, 6, 1),
            (60.0, 5, 1),
        ] {
            let doc = report(300.0, body, n).paginate().unwrap();
            assert_eq!(doc.page_count(), pages, "body {body} x {n}");
        }
    }

    #[test]
    fn names_and_sources_are_stripped_and_margin_applied() {
        let mut report = report(300.0, 50.0, 1);
        report.set_page_margin(Margin::new(10.0, 0.0, 0.0, 15.0));
        let doc = report.paginate().unwrap();
        let node = &doc.pages[0].nodes[0];
        assert!(!node.has_attr("name"));
        assert!(!node.has_attr("source"));
        assert_eq!(node.attr("x"), Some("15"));
        assert_eq!(node.attr("y"), Some("10"));
        assert_eq!(node.text.as_deref(), Some("row1"));
    }

    #[test]
    fn total_pages_resolved_on_every_page() {
        let mut report = report(300.0, 50.0, 13);
        report.add_object(
            SectionKind::Body,
            text("counter", 0.0, 10.0, r#"@Page "/" @Pages"#),
        );
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 3);
        for (i, page) in doc.pages.iter().enumerate() {
            for t in texts(page).iter().filter(|t| t.contains('/')) {
                assert_eq!(t, &format!("{}/3", i + 1));
            }
        }
    }

    #[test]
    fn unknown_fields_use_handler_then_error() {
        let mut report = report(300.0, 50.0, 1);
        report.remove_object("cell");
        report.add_object(SectionKind::Body, text("cell", 0.0, 10.0, "missing"));

        let doc = report.paginate().unwrap();
        assert_eq!(texts(&doc.pages[0]), ["{ERROR}"]);

        let mut seen = Vec::new();
        let doc = Paginator::new(&report)
            .on_field_request(|name, ctx| {
                seen.push(format!("{name} {ctx:?}"));
                Some("X".to_string())
            })
            .run()
            .unwrap();
        assert_eq!(texts(&doc.pages[0]), ["X"]);
        assert_eq!(seen, ["missing Table { row: 0 }"]);

        let doc = Paginator::new(&report)
            .on_field_request(|_, _| None)
            .run()
            .unwrap();
        assert_eq!(texts(&doc.pages[0]), ["{ERROR}"]);
    }

    #[test]
    fn single_page_footer_respects_last_page_over_first_page() {
        let mut report = report(100.0, 20.0, 1);
        report.add_object(SectionKind::PageFooter, text("foot", 0.0, 10.0, r#""end""#));
        let footer = report.section_mut(SectionKind::PageFooter);
        footer.height = 10.0;
        footer.first_page = false;
        footer.last_page = true;

        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(texts(&doc.pages[0]), ["row1", "end"]);
        assert_eq!(ys(&doc.pages[0]), [0.0, 90.0]);
    }

    #[test]
    fn page_footer_reflects_the_page_being_closed() {
        let mut report = report(100.0, 20.0, 6);
        report.add_object(SectionKind::PageFooter, text("foot", 0.0, 10.0, "name"));
        report.set_section_height(SectionKind::PageFooter, 10.0);

        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(
            texts(&doc.pages[0]),
            ["row1", "row2", "row3", "row4", "row4"]
        );
        assert_eq!(texts(&doc.pages[1]), ["row5", "row6", "row6"]);

        report.section_mut(SectionKind::PageFooter).first_page = false;
        let doc = report.paginate().unwrap();
        assert_eq!(texts(&doc.pages[0]), ["row1", "row2", "row3", "row4"]);
        assert_eq!(texts(&doc.pages[1]), ["row5", "row6", "row6"]);

        report.section_mut(SectionKind::PageFooter).last_page = false;
        let doc = report.paginate().unwrap();
        assert_eq!(texts(&doc.pages[1]), ["row5", "row6"]);
    }

    #[test]
    fn page_header_flags() {
        let mut report = report(100.0, 20.0, 6);
        report.add_object(SectionKind::PageHeader, text("head", 0.0, 10.0, "@Page"));
        report.set_section_height(SectionKind::PageHeader, 10.0);

        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(texts(&doc.pages[0])[0], "1");
        assert_eq!(ys(&doc.pages[0])[..2], [0.0, 10.0]);
        assert_eq!(texts(&doc.pages[1])[0], "2");

        report.section_mut(SectionKind::PageHeader).first_page = false;
        report.section_mut(SectionKind::PageHeader).last_page = false;
        let doc = report.paginate().unwrap();
        assert_eq!(texts(&doc.pages[0])[0], "row1");
        assert_eq!(ys(&doc.pages[0])[0], 0.0);
        // removed from the last page, space kept
        assert_eq!(texts(&doc.pages[1]), ["row6"]);
        assert_eq!(ys(&doc.pages[1]), [10.0]);
    }

    #[test]
    fn body_new_page_after_breaks_every_row() {
        let mut report = report(300.0, 20.0, 3);
        report.section_mut(SectionKind::Body).new_page_after = true;
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 3);
        assert!(doc.pages.iter().all(|p| ys(p) == [0.0]));
    }

    #[test]
    fn report_header_and_footer() {
        let mut report = report(100.0, 20.0, 2);
        report.add_object(SectionKind::ReportHeader, text("title", 0.0, 10.0, r#""Title""#));
        report.set_section_height(SectionKind::ReportHeader, 30.0);
        report.add_object(SectionKind::ReportFooter, text("total", 0.0, 10.0, r#""Total " name"#));
        report.set_section_height(SectionKind::ReportFooter, 10.0);

        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(texts(&doc.pages[0]), ["Title", "row1", "row2", "Total row2"]);
        assert_eq!(ys(&doc.pages[0]), [0.0, 30.0, 50.0, 70.0]);

        report.section_mut(SectionKind::ReportHeader).new_page_after = true;
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(texts(&doc.pages[0]), ["Title"]);
        assert_eq!(ys(&doc.pages[1]), [0.0, 20.0, 40.0]);

        report.section_mut(SectionKind::ReportHeader).new_page_after = false;
        report.section_mut(SectionKind::ReportFooter).new_page_before = true;
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(texts(&doc.pages[1]), ["Total row2"]);
    }

    #[test]
    fn report_footer_overflow_gets_a_new_page_with_header() {
        let mut report = report(100.0, 20.0, 4);
        report.add_object(SectionKind::PageHeader, text("head", 0.0, 5.0, r#""H""#));
        report.set_section_height(SectionKind::PageHeader, 5.0);
        report.add_object(SectionKind::ReportFooter, text("sum", 0.0, 10.0, r#""S""#));
        report.set_section_height(SectionKind::ReportFooter, 10.0);

        // 5 + 4*20 = 85: a 10-high footer fits, a 20-high one does not
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 1);

        report.set_section_height(SectionKind::ReportFooter, 20.0);
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(texts(&doc.pages[1]), ["H", "S"]);
    }

    #[test]
    fn single_pass_without_data() {
        let mut report = Report::new();
        report.set_page_size(Size::new(100.0, 100.0));
        for (kind, name) in [
            (SectionKind::ReportFooter, "rf"),
            (SectionKind::PageFooter, "pf"),
            (SectionKind::Body, "b"),
            (SectionKind::PageHeader, "ph"),
            (SectionKind::ReportHeader, "rh"),
        ] {
            report.set_section_height(kind, 10.0);
            report.add_object(kind, text(name, 0.0, 10.0, &format!("\"{name}\"")));
        }
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(texts(&doc.pages[0]), ["ph", "rh", "b", "rf", "pf"]);
        assert_eq!(ys(&doc.pages[0]), [0.0, 10.0, 20.0, 30.0, 90.0]);
    }

    #[test]
    fn hidden_objects_are_kept_and_sizeless_ones_skipped() {
        let mut report = report(300.0, 50.0, 1);
        let ReportObject::Text(mut hidden) = text("hidden", 0.0, 5.0, "computed") else {
            unreachable!()
        };
        hidden.base.visible = false;
        report.add_object(SectionKind::Body, ReportObject::Text(hidden));
        let mut sizeless = TextObject::new("sizeless", Point::new(0.0, 0.0)).unwrap();
        sizeless.source = Some(r#""s""#.into());
        report.add_object(SectionKind::Body, ReportObject::Text(sizeless));

        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let doc = Paginator::new(&report)
            .on_field_request(move |name, _| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                (name == "computed").then(|| "c".to_string())
            })
            .run()
            .unwrap();
        let page = &doc.pages[0];
        assert_eq!(texts(page), ["row1", "c"]);
        assert_eq!(page.nodes[1].attr("visible"), Some("n"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(page.objects().filter(|o| o.is_visible()).count(), 1);
    }

    #[test]
    fn page_after_report_header_starts_at_top_margin() {
        let mut report = report(100.0, 20.0, 1);
        report.set_page_margin(Margin::new(10.0, 0.0, 0.0, 0.0));
        report.add_object(SectionKind::PageHeader, text("head", 0.0, 5.0, r#""H""#));
        report.set_section_height(SectionKind::PageHeader, 5.0);
        report.add_object(SectionKind::ReportHeader, text("title", 0.0, 10.0, r#""Title""#));
        report.set_section_height(SectionKind::ReportHeader, 10.0);
        report.section_mut(SectionKind::ReportHeader).new_page_after = true;

        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(texts(&doc.pages[1]), ["H", "row1"]);
        assert_eq!(ys(&doc.pages[1]), [10.0, 15.0]);
    }

    #[test]
    fn tree_model_rows() {
        let mut report = report(300.0, 50.0, 0);
        report.set_tree_model(
            Arc::new(rows(2)),
            HashMap::from([("name".to_string(), 0)]),
        );
        let doc = report.paginate().unwrap();
        assert_eq!(texts(&doc.pages[0]), ["row1", "row2"]);
    }

    #[test]
    fn sql_provider_results_and_failures() {
        let mut report = report(300.0, 50.0, 0);
        report.set_database("memory", "db", "SELECT name FROM t");

        let doc = Paginator::new(&report)
            .with_sql_provider("memory", |conn: &str, sql: &str| -> Result<TableModel, Error> {
                assert_eq!((conn, sql), ("db", "SELECT name FROM t"));
                Ok(rows(3))
            })
            .run()
            .unwrap();
        assert_eq!(texts(&doc.pages[0]), ["row1", "row2", "row3"]);

        assert!(matches!(report.paginate(), Err(Error::Database(_))));

        let failed = Paginator::new(&report)
            .with_sql_provider("memory", |_: &str, _: &str| -> Result<TableModel, Error> {
                Err(Error::Database("connection refused".into()))
            })
            .run();
        assert!(matches!(failed, Err(Error::Database(_))));
    }

    #[test]
    fn empty_data_source_keeps_one_page() {
        let mut report = report(300.0, 50.0, 0);
        report.add_object(SectionKind::PageHeader, text("head", 0.0, 5.0, "@Pages"));
        report.set_section_height(SectionKind::PageHeader, 5.0);
        let doc = report.paginate().unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(texts(&doc.pages[0]), ["1"]);
    }
}
