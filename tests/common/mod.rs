#![allow(dead_code)]

use reptool::{FixedPage, TableModel};

/// A listing report: a page header with the page number, one text row per
/// record and a page footer with "page/total". Page height 300, no margins.
pub const LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<reptool>
  <properties>
    <unit-length>pt</unit-length>
    <output-type>pdf</output-type>
  </properties>
  <page width="200" height="300"/>
  <report>
    <page-header height="20">
      <text name="heading" x="0" y="0" width="200" height="20" source="&quot;Listing p.&quot; @Page"/>
    </page-header>
    <body height="40">
      <text name="name" x="0" y="0" width="100" height="20" source="name"/>
      <text name="city" x="100" y="0" width="100" height="20" source="city"/>
    </body>
    <page-footer height="20">
      <text name="counter" x="0" y="0" width="200" height="20" source="@Page &quot;/&quot; @Pages"/>
    </page-footer>
  </report>
</reptool>
"#;

pub fn people(n: usize) -> TableModel {
    let mut model = TableModel::new(["name", "city"]);
    for i in 1..=n {
        model.push_row([format!("person{i}"), format!("city{i}")]);
    }
    model
}

/// Resolved text of every text node on the page, in emission order.
pub fn texts(page: &FixedPage) -> Vec<String> {
    page.nodes
        .iter()
        .filter(|n| n.tag == "text")
        .filter_map(|n| n.text.clone())
        .collect()
}

pub fn attr_f64(page: &FixedPage, index: usize, key: &str) -> f64 {
    page.nodes[index]
        .attr(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(f64::NAN)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
