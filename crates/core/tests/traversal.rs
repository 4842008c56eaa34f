use std::collections::HashMap;
use std::sync::Arc;
use tagpress_core::idf::{Cell, Chunk, Formula, Image, Note, Paragraph, Row, Span, Table};
use tagpress_core::settings::SettingsStore;
use tagpress_core::traits::{ArtifactStore, InMemoryArtifactStore};
use tagpress_core::types::{ManualFormat, Realm, StyleDecl};
use tagpress_core::{ConvertOptions, ConvertOutput, Converter};
use rstest::rstest;
use tagpress_source::MemorySource;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn convert_with(
    source: &MemorySource,
    settings: SettingsStore,
    options: ConvertOptions,
    artifacts: Arc<dyn ArtifactStore>,
) -> ConvertOutput {
    init_logger();
    Converter::run(source, settings, options, artifacts).expect("conversion should succeed")
}

fn convert(source: &MemorySource, settings: SettingsStore, options: ConvertOptions) -> ConvertOutput {
    convert_with(source, settings, options, Arc::new(InMemoryArtifactStore::default()))
}

fn manual() -> ConvertOptions {
    ConvertOptions {
        manual: true,
        ..ConvertOptions::default()
    }
}

fn body_document(paragraphs: &[&str]) -> MemorySource {
    paragraphs.iter().fold(
        MemorySource::new("doc").with_style(StyleDecl::in_realm(Realm::Paragraph, "Body")),
        |source, text| source.with_node(Paragraph::styled("Body").with_text(*text)),
    )
}

#[test]
fn test_output_starts_with_banner_and_color_table() {
    let output = convert(&body_document(&["one"]), SettingsStore::in_memory(), ConvertOptions::default());
    assert!(output.text.starts_with("<UNICODE-MAC>\n<Version:13.1><ColorTable:="));
    assert!(!output.text.contains("FeatureSet"));
    assert!(output.text.ends_with("<ParaStyle:Body>one\n"));
}

#[test]
fn test_rtl_documents_get_the_feature_set() {
    let source = body_document(&["one"]).with_properties(tagpress_core::types::DocumentProperties {
        has_rtl: true,
        pure_ascii: false,
    });
    let output = convert(&source, SettingsStore::in_memory(), ConvertOptions::default());
    assert!(output.text.contains("<Version:13.1><FeatureSet:Indesign-R2L><ColorTable:="));
}

#[test]
fn test_empty_document_still_has_a_header() {
    let output = convert(&MemorySource::new("empty"), SettingsStore::in_memory(), ConvertOptions::default());
    assert!(output.text.starts_with("<UNICODE-MAC>\n"));
    assert!(!output.text.contains("<ParaStyle:"));
}

#[test]
fn test_styles_are_defined_before_first_use_and_only_once() {
    let output = convert(
        &body_document(&["one", "two", "three"]),
        SettingsStore::in_memory(),
        ConvertOptions::default(),
    );
    let text = &output.text;
    let definition = text.find("<DefineParaStyle:Body").expect("Body is defined");
    let first_use = text.find("<ParaStyle:Body>").expect("Body is used");
    assert!(definition < first_use);
    assert_eq!(text.matches("<DefineParaStyle:Body").count(), 1);
    assert_eq!(text.matches("<ParaStyle:Body>").count(), 3);

    // The base is defined before the style based on it.
    let base = text.find("<DefineParaStyle:NormalParagraphStyle").expect("base is defined");
    assert!(base < definition);
    assert!(text.contains("<BasedOn:NormalParagraphStyle>>"));
}

#[test]
fn test_text_is_escaped() {
    let output = convert(&body_document(&["a<b>c"]), SettingsStore::in_memory(), ConvertOptions::default());
    assert!(output.text.contains("<ParaStyle:Body>a\\<b\\>c\n"));
}

#[test]
fn test_first_in_doc_rule_turns_only_the_first_paragraph() {
    let settings = SettingsStore::parse(
        "[Rule:Opening]\n\
         turn_this=[Paragraph:Body]\n\
         into_this=[Paragraph:Opening]\n\
         when_first_in_doc=true\n",
    );
    let output = convert(&body_document(&["one", "two", "three"]), settings, ConvertOptions::default());

    let text = &output.text;
    assert!(text.contains("<ParaStyle:Opening>one\n"));
    assert!(text.contains("<ParaStyle:Body>two\n"));
    assert!(text.contains("<ParaStyle:Body>three\n"));
    assert!(text.contains("<DefineParaStyle:Opening"));
    assert_eq!(
        output.stats.rule_applications,
        vec![("<R1 \"Opening\">".to_string(), 1)]
    );
    assert!(output.settings.has_section("Paragraph:Opening"));
}

#[test]
fn test_when_following_rule_uses_resolved_previous_style() {
    let settings = SettingsStore::parse(
        "[Rule:After title]\n\
         turn_this=[Paragraph:Body]\n\
         into_this=[Paragraph:Lead]\n\
         when_following=[Paragraph:Title]\n",
    );
    let source = MemorySource::new("doc")
        .with_style(StyleDecl::in_realm(Realm::Paragraph, "Title"))
        .with_style(StyleDecl::in_realm(Realm::Paragraph, "Body"))
        .with_node(Paragraph::styled("Title").with_text("Heading"))
        .with_node(Paragraph::styled("Body").with_text("one"))
        .with_node(Paragraph::styled("Body").with_text("two"));
    let output = convert(&source, settings, ConvertOptions::default());

    assert!(output.text.contains("<ParaStyle:Lead>one\n"));
    assert!(output.text.contains("<ParaStyle:Body>two\n"));
}

#[test]
fn test_paragraphs_after_empty_ones_are_spaced() {
    let source = MemorySource::new("doc")
        .with_node(Paragraph::new().with_text(""))
        .with_node(Paragraph::new().with_text(""))
        .with_node(Paragraph::new().with_text("text"));
    let output = convert(&source, SettingsStore::in_memory(), manual());

    assert!(output.text.contains("<ParaStyle:(tagpress)\\:(NORMAL)>\n"));
    assert!(output.text.contains("<ParaStyle:(tagpress)\\:(SPACED)>text\n"));
}

#[test]
fn test_page_break_makes_the_next_paragraph_new_page() {
    let source = MemorySource::new("doc")
        .with_node(Paragraph::new().with_text("before").with_page_break())
        .with_node(Paragraph::new().with_text(""))
        .with_node(Paragraph::new().with_text("after"));
    let output = convert(&source, SettingsStore::in_memory(), manual());

    // The empty paragraph keeps the break pending.
    assert_eq!(output.text.matches("<ParaStyle:(tagpress)\\:(NEW_PAGE)>").count(), 2);
    assert!(output.text.contains("<ParaStyle:(tagpress)\\:(NEW_PAGE)>after\n"));
}

#[test]
fn test_synthesized_style_is_shared_by_equal_formats() {
    let bold = |text: &str| Paragraph::new().with_span(Span::new(text).with_format(ManualFormat::BOLD));
    let source = MemorySource::new("doc")
        .with_node(bold("one"))
        .with_node(bold("two"))
        .with_node(bold("three"));
    let output = convert(&source, SettingsStore::in_memory(), manual());

    let text = &output.text;
    assert_eq!(text.matches("<DefineParaStyle:(tagpress)\\:(BOLD)").count(), 1);
    assert_eq!(text.matches("<ParaStyle:(tagpress)\\:(BOLD)>").count(), 3);
    // Bold is carried by the paragraph style, so spans need no style of their own.
    assert!(!text.contains("<CharStyle:"));
    assert_eq!(output.stats.synthesized_styles, 1);
}

#[test]
fn test_mixed_spans_get_character_styles() {
    let source = MemorySource::new("doc").with_node(
        Paragraph::new()
            .with_span(Span::new("plain "))
            .with_span(Span::new("loud").with_format(ManualFormat::BOLD)),
    );
    let output = convert(&source, SettingsStore::in_memory(), manual());

    let text = &output.text;
    assert!(text.contains("<ParaStyle:(tagpress)\\:(NORMAL)>plain <Define"));
    assert!(text.contains("<CharStyle:(tagpress)\\:(BOLD)>loud<CharStyle:>\n"));
}

#[test]
fn test_builtin_character_style_is_dropped_under_manual() {
    let source = MemorySource::new("doc")
        .with_style(StyleDecl::in_realm(Realm::Character, "Hyperlink"))
        .with_node(
            Paragraph::new()
                .with_span(Span::new("plain "))
                .with_span(Span::new("link ").with_style("Hyperlink"))
                .with_span(Span::new("boldlink").with_style("Hyperlink").with_format(ManualFormat::BOLD)),
        );
    let output = convert(&source, SettingsStore::in_memory(), manual());

    let text = &output.text;
    assert!(!text.contains("<CharStyle:Hyperlink>"));
    assert!(text.contains(">plain link <Define"));
    assert!(text.contains("<CharStyle:(tagpress)\\:(BOLD)>boldlink<CharStyle:>\n"));
}

#[rstest]
#[case(ManualFormat::CENTERED, ManualFormat::NORMAL, "(tagpress)\\:(CENTERED)")]
#[case(ManualFormat::CENTERED, ManualFormat::BOLD, "(tagpress)\\:(CENTERED_BOLD)")]
#[case(ManualFormat::NORMAL, ManualFormat::ITALIC | ManualFormat::SUPERSCRIPT, "(tagpress)\\:(ITALIC_SUPERSCRIPT)")]
#[case(ManualFormat::RTL | ManualFormat::JUSTIFIED, ManualFormat::NORMAL, "(tagpress)\\:(JUSTIFIED_RTL)")]
fn test_paragraph_formats_name_synthesized_styles(
    #[case] paragraph: ManualFormat,
    #[case] span: ManualFormat,
    #[case] expected: &str,
) {
    let source = MemorySource::new("doc")
        .with_node(Paragraph::new().with_format(paragraph).with_span(Span::new("t").with_format(span)));
    let output = convert(&source, SettingsStore::in_memory(), manual());
    assert!(output.text.contains(&format!("<ParaStyle:{}>t\n", expected)));
}

#[test]
fn test_default_direction_is_not_a_format() {
    let source = MemorySource::new("doc").with_node(
        Paragraph::new()
            .with_format(ManualFormat::LTR)
            .with_text("text"),
    );
    let output = convert(&source, SettingsStore::in_memory(), manual());
    assert!(output.text.contains("<ParaStyle:(tagpress)\\:(NORMAL)>text\n"));
}

#[test]
fn test_unused_parent_is_replaced_by_base() {
    let source = MemorySource::new("doc")
        .with_style(StyleDecl::in_realm(Realm::Paragraph, "Child").with_parent("ghost"))
        .with_node(Paragraph::styled("Child").with_text("text"));
    let output = convert(&source, SettingsStore::in_memory(), ConvertOptions::default());

    assert!(output.text.contains("<DefineParaStyle:Child"));
    assert!(!output.text.contains("ghost"));
    let child = output.text.find("<DefineParaStyle:Child").unwrap();
    assert!(output.text[child..].starts_with("<DefineParaStyle:Child<pShadingColor:Yellow>"));
    assert!(output.text[child..].contains("<BasedOn:NormalParagraphStyle>>"));
}

#[test]
fn test_stop_marker_ends_conversion_mid_text() {
    let options = ConvertOptions {
        stop_marker: Some("STOP".into()),
        ..ConvertOptions::default()
    };
    let output = convert(
        &body_document(&["before", "keep STOP drop", "after"]),
        SettingsStore::in_memory(),
        options,
    );

    assert!(output.text.ends_with("<ParaStyle:Body>before\n<ParaStyle:Body>keep \n"));
    assert!(!output.text.contains("drop"));
    assert!(output.stats.stop_marker_found);
    assert_eq!(output.settings.get("General", "stop_marker"), Some("STOP"));
}

#[test]
fn test_stop_marker_at_paragraph_start_drops_the_paragraph() {
    let options = ConvertOptions {
        stop_marker: Some("STOP".into()),
        ..ConvertOptions::default()
    };
    let output = convert(&body_document(&["before", "STOP here"]), SettingsStore::in_memory(), options);
    assert!(output.text.ends_with("<ParaStyle:Body>before\n"));
    assert!(output.stats.stop_marker_found);
}

#[test]
fn test_stop_marker_is_remembered_between_runs() {
    let settings = SettingsStore::parse("[General]\nstop_marker=STOP\n");
    let output = convert(&body_document(&["one", "STOP", "two"]), settings, ConvertOptions::default());
    assert!(!output.text.contains("two"));
    assert!(output.stats.stop_marker_found);
}

#[test]
fn test_missing_stop_marker_converts_everything() {
    let options = ConvertOptions {
        stop_marker: Some("STOP".into()),
        ..ConvertOptions::default()
    };
    let output = convert(&body_document(&["one", "two"]), SettingsStore::in_memory(), options);
    assert!(output.text.ends_with("<ParaStyle:Body>two\n"));
    assert!(!output.stats.stop_marker_found);
}

#[test]
fn test_stop_marker_inside_footnote_closes_it() {
    let options = ConvertOptions {
        stop_marker: Some("STOP".into()),
        ..ConvertOptions::default()
    };
    let note = Note::new(vec![Paragraph::new().with_text("note STOP rest")]);
    let source = MemorySource::new("doc")
        .with_node(Paragraph::new().with_span(Span::new("text").with_footnote(note)))
        .with_node(Paragraph::new().with_text("after"));
    let output = convert(&source, SettingsStore::in_memory(), options);

    assert!(output.text.contains("<FootnoteStart:><ParaStyle:>note <FootnoteEnd:><CharStyle:>\n"));
    assert!(!output.text.contains("rest"));
    assert!(!output.text.contains("after"));
}

#[test]
fn test_footnote_text_loses_leading_whitespace() {
    let note = Note::new(vec![Paragraph::new().with_text("  Note body")]);
    let source = MemorySource::new("doc").with_node(
        Paragraph::new()
            .with_span(Span::new("Text").with_footnote(note))
            .with_span(Span::new(" more")),
    );
    let output = convert(&source, SettingsStore::in_memory(), ConvertOptions::default());

    let text = &output.text;
    let reference = text.find("<DefineCharStyle:(tagpress)\\:(Footnote Reference in Text)").unwrap();
    assert!(reference > text.find("<ParaStyle:>Text").unwrap());
    assert!(text.contains(
        "<CharStyle:(tagpress)\\:(Footnote Reference in Text)><FootnoteStart:><ParaStyle:>Note body<FootnoteEnd:><CharStyle:> more\n"
    ));
}

#[test]
fn test_comments_are_converted_only_on_request() {
    let comment = Note::new(vec![Paragraph::new().with_text("remark")]);
    let source = MemorySource::new("doc")
        .with_node(Paragraph::new().with_span(Span::new("text").with_comment(comment)));

    let skipped = convert(&source, SettingsStore::in_memory(), ConvertOptions::default());
    assert!(!skipped.text.contains("remark"));
    assert!(!skipped.text.contains("FootnoteStart"));

    let options = ConvertOptions {
        convert_comments: true,
        ..ConvertOptions::default()
    };
    let converted = convert(&source, SettingsStore::in_memory(), options);
    assert!(converted.text.contains(
        "<CharStyle:(tagpress)\\:(Comment Reference)><FootnoteStart:><ParaStyle:>remark<FootnoteEnd:>"
    ));
}

#[test]
fn test_table_is_wrapped_in_container_paragraph() {
    let table = Table::new(Some("Grid"))
        .with_header_rows(1)
        .with_row(Row::new(vec![
            Cell::new(Paragraph::new().with_text("a")),
            Cell::new(Paragraph::new().with_text("b")),
        ]))
        .with_row(Row::new(vec![Cell::new(Paragraph::new().with_text("wide")).with_span(1, 2)]));
    let source = MemorySource::new("doc").with_node(table);
    let output = convert(&source, SettingsStore::in_memory(), ConvertOptions::default());

    let text = &output.text;
    assert!(text.contains("<ParaStyle:(tagpress)\\:(Table Container)>"));
    assert!(text.contains("<TableStyle:Grid><TableStart:2,2:1:0:LTR>"));
    assert!(text.contains(
        "<RowStart:><CellStart:1,1><ParaStyle:>a<CellEnd:><CellStart:1,1><ParaStyle:>b<CellEnd:><RowEnd:>"
    ));
    assert!(text.contains(
        "<RowStart:><CellStart:1,2><ParaStyle:>wide<CellEnd:><CellStart:><CellEnd:><RowEnd:><TableEnd:>\n"
    ));
    let definition = text.find("<DefineTableStyle:Grid").expect("table style is defined");
    assert!(definition < text.find("<TableStyle:Grid>").unwrap());
}

#[test]
fn test_rtl_tables_are_marked() {
    let table = Table {
        format: ManualFormat::RTL,
        ..Table::new(None)
    }
    .with_row(Row::new(vec![Cell::new(Paragraph::new().with_text("x"))]));
    let output = convert(
        &MemorySource::new("doc").with_node(table),
        SettingsStore::in_memory(),
        ConvertOptions::default(),
    );
    assert!(output.text.contains("<TableStyle:><TableStart:1,1:0:0:RTL>"));
}

#[test]
fn test_images_become_placeholders() {
    let store = Arc::new(InMemoryArtifactStore::default());
    let image = Image {
        suffix: ".png".into(),
        data: Arc::new(vec![0x89, b'P', b'N', b'G']),
    };
    let source = MemorySource::new("doc").with_node(
        Paragraph::new()
            .with_text("see ")
            .with_chunk(Chunk::Image(image)),
    );
    let output = convert_with(&source, SettingsStore::in_memory(), ConvertOptions::default(), store.clone());

    assert!(
        output
            .text
            .contains("<CharStyle:(tagpress)\\:(Image)>document-image-001.png<CharStyle:>\n")
    );
    assert_eq!(store.len(), 1);
    assert!(store.get("document-image-001.png").is_some());
}

#[test]
fn test_formulas_share_the_artifact_numbering() {
    let store = Arc::new(InMemoryArtifactStore::new("book"));
    let image = Image {
        suffix: ".png".into(),
        data: Arc::new(vec![1, 2, 3]),
    };
    let formula = Formula {
        mathml: "<math><mi>x</mi></math>".into(),
    };
    let source = MemorySource::new("doc").with_node(
        Paragraph::new()
            .with_chunk(Chunk::Image(image))
            .with_chunk(Chunk::Formula(formula)),
    );
    let output = convert_with(&source, SettingsStore::in_memory(), ConvertOptions::default(), store.clone());

    assert!(output.text.contains("book-image-001.png"));
    assert!(output.text.contains("<CharStyle:(tagpress)\\:(Formula)>book-formula-002.mathml"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_bound_paragraphs_define_text_variables() {
    let options = ConvertOptions {
        style_to_variable: HashMap::from([("Title".to_string(), "DocTitle".to_string())]),
        ..ConvertOptions::default()
    };
    let source = MemorySource::new("doc")
        .with_style(StyleDecl::in_realm(Realm::Paragraph, "Title"))
        .with_node(Paragraph::styled("Title").with_text("Hello"));
    let output = convert(&source, SettingsStore::in_memory(), options);

    assert!(output.text.contains(
        "<ParaStyle:Title>Hello<DefineTextVariable:DocTitle=<TextVarType:CustomText><tvString:Hello>>\n"
    ));
}

#[test]
fn test_settings_override_names_and_markup() {
    let settings = SettingsStore::parse(
        "[Paragraph:Body]\nname=Body Text\nmarkup=<pHyphenation:0>\n",
    );
    let output = convert(&body_document(&["one"]), settings, ConvertOptions::default());
    assert!(output.text.contains("<DefineParaStyle:Body Text<pHyphenation:0><BasedOn:NormalParagraphStyle>>"));
    assert!(output.text.contains("<ParaStyle:Body Text>one\n"));
}

#[test]
fn test_used_styles_are_counted_per_realm() {
    let source = body_document(&["one"]).with_node(
        Paragraph::styled("Body").with_span(Span::new("x").with_style("Strong")),
    );
    let output = convert(&source, SettingsStore::in_memory(), ConvertOptions::default());
    let used: HashMap<Realm, usize> = output.stats.used_styles.iter().copied().collect();
    assert!(used[&Realm::Paragraph] >= 2);
    assert!(used[&Realm::Character] >= 1);
    assert!(output.settings.has_section("Character:Strong"));
}

#[test]
fn test_special_styles_count_only_once_met() {
    let used = |source: &MemorySource| -> HashMap<Realm, usize> {
        let output = convert(source, SettingsStore::in_memory(), ConvertOptions::default());
        output.stats.used_styles.iter().copied().collect()
    };
    let plain = used(&body_document(&["one"]));
    let with_note = used(&body_document(&["one"]).with_node(
        Paragraph::styled("Body").with_span(
            Span::new("two").with_footnote(Note::new(vec![Paragraph::new().with_text("note")])),
        ),
    ));

    assert_eq!(with_note[&Realm::Character], plain[&Realm::Character] + 1);
    assert_eq!(with_note[&Realm::Paragraph], plain[&Realm::Paragraph]);
}

#[test]
fn test_text_transforms_apply_to_output() {
    let options = ConvertOptions {
        transforms: tagpress_core::render::TextTransforms {
            maqaf: true,
            vav: false,
        },
        ..ConvertOptions::default()
    };
    let output = convert(&body_document(&["a=b"]), SettingsStore::in_memory(), options);
    assert!(output.text.contains("<ParaStyle:Body>a\u{05BE}b\n"));
}
