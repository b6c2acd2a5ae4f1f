use std::sync::Arc;

use content_studio_engine::render::{StyleResolver, sorted_blocks, split_email_header};
use content_studio_engine::{
    BlockBody, BlockId, BlockList, BlockUpdate, Composition, CompositionKind, CompositionStore,
    ContentBlock, EmailContainerConfig, EmailPlatform, HtmlExportOptions, ImageBlock,
    MdxExportOptions, PasteOutcome, RenderMode, RenderRequest, RenderStatus, StylesheetData,
    StylesheetState, TextBlock, export_html, export_mdx, render,
    store::MemoryCompositionStore,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn orders(list: &BlockList) -> Vec<usize> {
    list.blocks().iter().map(|block| block.order).collect()
}

fn assert_dense(list: &BlockList) {
    let expected: Vec<usize> = (0..list.len()).collect();
    assert_eq!(orders(list), expected);
}

fn header_image(id: &str) -> ContentBlock {
    let mut image = ImageBlock::new(format!("https://cdn.test/{id}.jpg"), id);
    image.email.is_full_width = true;
    ContentBlock::new(BlockBody::Image(image)).with_id(id)
}

fn sample_blocks() -> Vec<ContentBlock> {
    vec![
        header_image("hero"),
        ContentBlock::heading(2, "Spring service offer").with_id("h"),
        ContentBlock::text("Book before the end of the month.").with_id("p"),
        ContentBlock::new(BlockBody::List(content_studio_engine::ListBlock::new([
            "Oil change",
            "Tyre check",
        ])))
        .with_id("l"),
    ]
}

#[test]
fn order_stays_dense_through_every_mutation() {
    let mut list = BlockList::from_blocks(sample_blocks());
    assert_dense(&list);

    list.push(ContentBlock::text("appended")).unwrap();
    assert_dense(&list);

    list.insert_at(1, ContentBlock::text("second")).unwrap();
    assert_dense(&list);

    list.move_block(&BlockId::new("hero"), 3).unwrap();
    assert_dense(&list);

    list.remove(&BlockId::new("h")).unwrap();
    assert_dense(&list);

    list.replace(&BlockId::new("p"), BlockBody::Text(TextBlock::new("converted")))
        .unwrap();
    assert_dense(&list);

    let inserted = list
        .insert_after(
            &BlockId::new("l"),
            vec![ContentBlock::text("a"), ContentBlock::text("b")],
        )
        .unwrap();
    assert_eq!(inserted.len(), 2);
    assert_dense(&list);
}

#[test]
fn duplicate_then_save_yields_new_identity() {
    let mut store = MemoryCompositionStore::new();
    let mut original = Composition::new("Spring offer", CompositionKind::Email);
    original.blocks = sample_blocks();
    let original_id = store.create(&mut original).unwrap();

    let mut copy = store.get(&original_id).unwrap().duplicate();
    let copy_id = store.create(&mut copy).unwrap();

    assert_ne!(copy_id, original_id);
    assert_eq!(store.get(&copy_id).unwrap().name, "Spring offer (Copy)");
    assert_eq!(store.get(&original_id).unwrap().name, "Spring offer");
    assert_eq!(store.get(&copy_id).unwrap().blocks, original.blocks);
}

#[rstest]
#[case::all_header(&["img", "img"], 2)]
#[case::leading_run(&["img", "img", "text", "img"], 2)]
#[case::text_first(&["text", "img"], 0)]
#[case::empty(&[], 0)]
fn email_header_is_only_the_leading_run(#[case] kinds: &[&str], #[case] header_len: usize) {
    let blocks: Vec<ContentBlock> = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| match *kind {
            "img" => header_image(&format!("b{i}")),
            _ => ContentBlock::text("body").with_id(format!("b{i}")),
        })
        .collect();
    let sorted = sorted_blocks(&blocks);

    let (header, content) = split_email_header(&sorted);

    assert_eq!(header.len(), header_len);
    assert_eq!(header.len() + content.len(), blocks.len());
}

#[test]
fn stylesheet_class_beats_block_formatting_and_defaults() {
    let sheet = StylesheetData::from_css("house", "House", ".brand { color: #ff0000; }");
    let mut text = TextBlock::new("Hello");
    text.formatting.color = Some("#0000ff".into());
    text.formatting.font_size = Some("18px".into());
    let block = ContentBlock::new(BlockBody::Text(text)).with_css_class("brand");

    let style = StyleResolver::new(Some(&sheet)).resolve(
        &block,
        &[("color", "#111111"), ("font-size", "16px"), ("margin", "0")],
    );

    assert_eq!(style.get("color"), Some("#ff0000"));
    assert_eq!(style.get("font-size"), Some("18px"));
    assert_eq!(style.get("margin"), Some("0"));
}

#[test]
fn paste_fans_out_headers_and_long_lines() {
    let mut list = BlockList::from_blocks(vec![
        ContentBlock::text("existing").with_id("target"),
        ContentBlock::text("after").with_id("after"),
    ]);

    let outcome = content_studio_engine::editing::apply_paste(
        &mut list,
        &BlockId::new("target"),
        "## Why service now\nBecause winter is hard on engines.\nok\n## Book today\n",
    )
    .unwrap();

    let PasteOutcome::Intercepted { inserted } = outcome else {
        panic!("expected interception");
    };
    let kinds: Vec<String> = list
        .blocks()
        .iter()
        .map(|block| match &block.body {
            BlockBody::Text(text) => format!("{}:{}", text.element.tag(), text.content),
            other => other.type_name().to_string(),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "p:existing",
            "h2:Why service now",
            "p:Because winter is hard on engines.",
            "h2:Book today",
            "p:after",
        ]
    );
    assert_eq!(inserted.len(), 3);
    assert_dense(&list);
}

#[rstest]
#[case(RenderMode::Clean)]
#[case(RenderMode::NewsArticle)]
#[case(RenderMode::Email)]
fn rendering_is_deterministic(#[case] mode: RenderMode) {
    let blocks = Arc::new(sample_blocks());
    let first = render(&RenderRequest::new(mode, Arc::clone(&blocks)).with_name("Offer"));
    let second = render(&RenderRequest::new(mode, Arc::new(sample_blocks())).with_name("Offer"));

    assert_eq!(first.status, RenderStatus::Ready);
    assert_eq!(first.html, second.html);
}

#[test]
fn exports_are_deterministic_and_leave_input_alone() {
    let blocks = sample_blocks();
    let before = blocks.clone();
    let email = HtmlExportOptions::email(EmailContainerConfig::for_platform(
        EmailPlatform::Mailchimp,
    ));
    let mdx = MdxExportOptions {
        gallery_id: Some("g-1".into()),
        ..MdxExportOptions::default()
    };

    assert_eq!(export_html(&blocks, &email), export_html(&blocks, &email));
    assert_eq!(export_mdx(&blocks, &mdx), export_mdx(&blocks, &mdx));
    assert_eq!(blocks, before);
}

#[test]
fn unknown_block_types_survive_and_render_a_placeholder() {
    let json = r#"[
        {"id": "a", "order": 0, "type": "text", "content": "Hi"},
        {"id": "b", "order": 1, "type": "carousel", "slides": [1, 2, 3]}
    ]"#;
    let blocks: Vec<ContentBlock> = serde_json::from_str(json).unwrap();
    assert_eq!(blocks[1].body.type_name(), "carousel");

    for mode in RenderMode::ALL {
        let output = render(&RenderRequest::new(mode, Arc::new(blocks.clone())));
        assert!(
            output.html.contains("Unsupported block type: carousel"),
            "{mode} output lacks placeholder"
        );
    }

    let saved = serde_json::to_value(&blocks[1]).unwrap();
    assert_eq!(saved["slides"], serde_json::json!([1, 2, 3]));
}

#[test]
fn newer_enum_values_do_not_sink_the_composition() {
    let mut composition = Composition::new("Drift", CompositionKind::Block);
    composition.blocks = vec![ContentBlock::text("kept").with_id("a")];
    let mut json = serde_json::to_value(&composition).unwrap();
    json["blocks"].as_array_mut().unwrap().push(serde_json::json!({
        "id": "b",
        "order": 1,
        "type": "text",
        "content": "Quoted",
        "element": "blockquote"
    }));

    let loaded: Composition = serde_json::from_value(json.clone()).unwrap();

    assert_eq!(loaded.blocks.len(), 2);
    assert!(matches!(loaded.blocks[0].body, BlockBody::Text(_)));
    assert_eq!(loaded.blocks[1].body.type_name(), "text");
    let output = render(&RenderRequest::new(RenderMode::Clean, Arc::new(loaded.blocks.clone())));
    assert!(output.html.contains("Unsupported block type: text"));
    assert_eq!(serde_json::to_value(&loaded).unwrap(), json);
}

#[test]
fn selected_but_missing_stylesheet_holds_rendering() {
    let request = RenderRequest::new(RenderMode::Clean, Arc::new(sample_blocks()))
        .with_stylesheet(StylesheetState::Loading);
    assert_eq!(render(&request).status, RenderStatus::Loading);

    let request = request.with_stylesheet(StylesheetState::Failed("timeout".into()));
    assert_eq!(render(&request).status, RenderStatus::Loading);
}

#[test]
fn updates_are_idempotent() {
    let mut list = BlockList::from_blocks(sample_blocks());
    let update = BlockUpdate::css_class(Some("lead".into()));

    list.update(&BlockId::new("p"), &update).unwrap();
    let once = list.blocks().to_vec();
    list.update(&BlockId::new("p"), &update).unwrap();

    assert_eq!(list.blocks(), once.as_slice());
}
