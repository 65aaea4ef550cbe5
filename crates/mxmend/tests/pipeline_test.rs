use mxmend::{
    MxmendError, Pipeline,
    merge::{MergeError, MergeSource},
    validate::Violation,
};

const GENERATED: &str = r#"<think>
The user wants a login page. I will put the <mxGraphModel> navbar on top.
</think>
Here is the diagram:

```xml
<mxGraphModel dx="1200" dy="800">
  <root>
    <mxCell id=0 />
    <mxCell id="1" parent=0 />
    <mxCell id="navbar" value="Home & About" style="rounded=0;fillColor=#dae8fc;" vertex=1 parent="1">
      <mxGeometry x="0" y="0" width="400" height="40" as="geometry"/>
    </mxCell>
    <mxCell id="form" value="Login form" vertex="1" parent="1">
      <mxGeometry x=20 y=30 width=360 height=200 />
    </mxCell>
    <mxCell id="footer" value="(c) 2024" vertex="1" parent="1">
      <mxGeometry x="0" y="560" width="400"/>
    </mxCell>
  </root>
</mxGraphModel>
```
"#;

#[test]
fn process_repairs_and_completes_generated_markup() {
    let pipeline = Pipeline::default();
    let document = pipeline.process(GENERATED).expect("repairable input");

    let nodes = document.renderable_nodes();
    let ids: Vec<_> = nodes.iter().map(|node| node.id().as_str()).collect();
    assert_eq!(ids, vec!["navbar", "form", "footer"]);

    let navbar = document.root().descendants("mxCell")[2];
    assert_eq!(navbar.attribute("value"), Some("Home & About"));

    let footer = nodes[2].geometry().expect("footer geometry");
    assert_eq!(footer.height(), 50.0);
}

#[test]
fn overlapping_document_is_rejected_then_resolved() {
    let pipeline = Pipeline::default();
    let document = pipeline.process(GENERATED).expect("repairable input");

    let err = pipeline.validate(&document).unwrap_err();
    assert!(matches!(
        err,
        MxmendError::SpatialViolation(Violation::Collision { .. })
    ));

    let resolved = pipeline.resolve(&document);
    assert_eq!(resolved.moves.len(), 1);
    assert_eq!(resolved.moves[0].id.as_str(), "form");
    assert_eq!(resolved.moves[0].to_y, 50.0);

    pipeline
        .validate(&resolved.document)
        .expect("resolved document is valid");
    assert!(pipeline.report(&resolved.document).is_clean());
}

#[test]
fn report_lists_every_defect() {
    let pipeline = Pipeline::default();
    let document = pipeline
        .process(
            r#"<mxGraphModel><root>
                <mxCell id="footer" vertex="1"><mxGeometry x="0" y="0" width="100" height="100"/></mxCell>
                <mxCell id="nav" vertex="1"><mxGeometry x="50" y="50" width="100" height="950"/></mxCell>
            </root></mxGraphModel>"#,
        )
        .expect("well formed");

    let report = pipeline.report(&document);
    assert_eq!(report.collisions.len(), 1);
    assert!(report.flow.is_none());
    // footer midpoint 50 and nav midpoint 525 on a 1000 high canvas
    assert_eq!(report.zones.len(), 2);
}

#[test]
fn missing_document_is_an_extraction_error() {
    let err = Pipeline::default()
        .process("I could not draw that, sorry.")
        .unwrap_err();
    assert!(matches!(err, MxmendError::ExtractionEmpty));
}

#[test]
fn unrepairable_markup_keeps_its_source() {
    let err = Pipeline::default()
        .process("<mxGraphModel><root><mxCell id=\"1\"></root></mxGraphModel>")
        .unwrap_err();

    let MxmendError::MalformedDocument { err, src } = err else {
        panic!("expected a malformed document error");
    };
    assert!(!err.diagnostics().is_empty());
    assert!(src.starts_with("<mxGraphModel>"));
}

#[test]
fn merge_readdresses_and_rejects() {
    let pipeline = Pipeline::default();
    let page = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel>"#;

    let merged = pipeline
        .merge(&[MergeSource::new("a", page), MergeSource::new("b", page)])
        .expect("valid sources");
    let ids: Vec<_> = merged
        .nodes()
        .iter()
        .map(|node| node.id().to_string())
        .collect();
    assert_eq!(ids, vec!["0", "1", "100", "101"]);

    let err = pipeline.merge(&[]).unwrap_err();
    assert!(matches!(err, MxmendError::MergeRejected(MergeError::NoInputs)));
}

#[test]
fn paginate_names_pages_after_sources() {
    let page = r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#;
    let file = Pipeline::default()
        .paginate(&[MergeSource::new("login", page), MergeSource::new("home", page)])
        .expect("valid sources");

    let rendered = file.to_string();
    assert!(rendered.starts_with("<mxfile>"));
    assert!(rendered.contains(r#"<diagram name="login">"#));
    assert!(rendered.contains(r#"<diagram name="home">"#));
}

#[test]
fn plan_accepts_both_component_shapes() {
    let blob = r#"<think>two views</think>
Sure! Here is the plan:
{
  "story_id": "US-42",
  "views": [
    {"name": "Login", "type": "page", "components": ["Form", "Button"]},
    {"name": "Reset", "type": "modal", "components": [{"component": "EmailField"}]}
  ],
  "reasoning": "The story needs a page
and a modal."
}"#;
    let plan = Pipeline::default().plan(blob).expect("valid plan");

    assert_eq!(plan.story_id(), "US-42");
    assert_eq!(plan.views()[0].components(), ["Form", "Button"]);
    assert_eq!(plan.views()[1].components(), ["EmailField"]);
    assert_eq!(plan.reasoning(), Some("The story needs a page\nand a modal."));
}

#[test]
fn plan_without_json_is_an_extraction_error() {
    let err = Pipeline::default().plan("no plan today").unwrap_err();
    assert!(matches!(err, MxmendError::ExtractionEmpty));

    let err = Pipeline::default().plan("{\"views\": []}").unwrap_err();
    assert!(matches!(err, MxmendError::Plan(_)));
}
