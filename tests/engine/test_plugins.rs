use std::fs;
use std::sync::Arc;

use apidoc::plugin::{
    DefaultPlugin, MenuPlacement, MenuPosition, MenuSection, MenuSide, PluginRegistryBuilder,
    TagProcessor,
};
use apidoc::{
    AnnotationEngine, AnnotationError, ConfigBuilder, PluginDescriptor, TagKind, TagKinds,
};

use super::helpers::{ChangelogPage, Fixture, RecordingPlugin, RepositoryLinks, SinceGenerator};

fn write_manifest(dir: &std::path::Path, file: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(file);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn later_plugin_overrides_see() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        dir.path(),
        "emphasis.toml",
        r#"
name = "emphasis"

[tags.see]
kinds = ["block"]
template = "<em>{escaped}</em>"
"#,
    );
    let fixture = Fixture::new();
    let recorder = RecordingPlugin::new(&[("custom", TagKinds::BLOCK)]);
    let engine = fixture.engine(
        ConfigBuilder::default().plugin(manifest).build(),
        vec![PluginDescriptor::new("recorder").with_tags(recorder.clone())],
    );

    let registry = engine.registry();
    assert_eq!(registry.processor_plugin("see", TagKind::Block), Some("emphasis"));
    assert_eq!(
        registry.processor_plugin("see", TagKind::InlineSimple),
        Some("default")
    );

    let tags = engine
        .process_block_tags(fixture.class("App\\Mailer"), &[])
        .unwrap();
    assert_eq!(tags["see"], vec!["<em>Smtp</em>"]);
    assert_eq!(tags["custom"], vec!["[custom:<raw> & value]"]);
    assert_eq!(recorder.calls(), vec!["custom:<raw> & value"]);
}

#[test]
fn manifest_renames_and_suppresses_tags() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
        dir.path(),
        "labels.toml",
        r#"
[tags.author]
kinds = ["block"]
rename = "Written by"

[tags.deprecated]
kinds = ["block"]
rename = ""
"#,
    );
    let fixture = Fixture::new();
    let engine = fixture.engine(
        ConfigBuilder::default().plugin(dir.path()).build(),
        Vec::new(),
    );
    assert!(engine.registry().plugin_names().contains("labels"));

    let tags = engine
        .process_block_tags(fixture.class("App\\Mailer"), &[])
        .unwrap();
    let names: Vec<&str> = tags.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["package", "Written by", "see", "custom"]);
    assert_eq!(tags["Written by"], vec!["Jane Doe &lt;jane@example.com&gt;"]);
}

#[test]
fn manifest_inline_tag_with_children() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        dir.path(),
        "note.toml",
        "[tags.note]\nkinds = [\"inline-with-children\"]\ntemplate = \"<aside>{value}</aside>\"\n",
    );
    let fixture = Fixture::new();
    let engine = fixture.engine(ConfigBuilder::default().plugin(manifest).build(), Vec::new());

    assert_eq!(
        engine
            .doc_line("{@note read {@link http://x}} & go", None)
            .unwrap(),
        "<aside>read <a href=\"http://x\">http://x</a></aside> &amp; go"
    );
}

#[test]
fn generators_merge_into_annotations() {
    let fixture = Fixture::new();
    let engine = fixture.engine(
        Default::default(),
        vec![PluginDescriptor::new("since").with_generator(Arc::new(SinceGenerator))],
    );

    let message = fixture.class("App\\Message");
    assert_eq!(engine.short_description(message).unwrap(), "Generated summary.");
    let tags = engine.process_block_tags(message, &[]).unwrap();
    assert_eq!(tags["since"], vec!["2.0"]);

    let mailer = fixture.class("App\\Mailer");
    assert_eq!(
        engine.short_description(mailer).unwrap(),
        "Sends mail.\n\nGenerated summary."
    );
    let tags = engine.process_block_tags(mailer, &[]).unwrap();
    let names: Vec<&str> = tags.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["deprecated", "package", "author", "since", "see", "custom"]
    );
}

#[test]
fn page_plugins_contribute_pages_and_menus() {
    let fixture = Fixture::new();
    let engine = fixture.engine(
        Default::default(),
        vec![PluginDescriptor::new("changelog").with_page(Arc::new(ChangelogPage))],
    );

    let pages = engine.render_custom_pages().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].file_name, "changelog.html");

    let main = engine.custom_menu_items(MenuPosition::Main);
    assert_eq!(main.len(), 1);
    assert_eq!(main[0].label, "Changelog");
    assert!(engine.custom_menu_items(MenuPosition::Footer).is_empty());
}

#[test]
fn custom_menus_cover_every_placement() {
    let fixture = Fixture::new();
    let bare = fixture.default_engine().custom_menus();
    assert_eq!(bare.keys().copied().collect::<Vec<_>>(), MenuPlacement::ALL.to_vec());
    assert!(bare.values().all(Vec::is_empty));

    let engine = fixture.engine(
        Default::default(),
        vec![
            PluginDescriptor::new("changelog").with_page(Arc::new(ChangelogPage)),
            PluginDescriptor::new("changelog-again").with_page(Arc::new(ChangelogPage)),
        ],
    );
    let menus = engine.custom_menus();
    assert_eq!(menus.len(), 8);
    let below_classes = &menus[&MenuPlacement::new(MenuSection::Classes, MenuSide::Below)];
    assert_eq!(below_classes.len(), 2);
    assert_eq!(below_classes[0].label, "Release notes");
    assert!(menus[&MenuPlacement::new(MenuSection::Classes, MenuSide::Above)].is_empty());
}

#[test]
fn source_link_plugin_replaces_default() {
    let fixture = Fixture::new();
    let engine = fixture.engine(
        Default::default(),
        vec![PluginDescriptor::new("repository").with_source_link(Arc::new(RepositoryLinks))],
    );

    assert_eq!(
        engine.source_url(fixture.class("App\\Mailer")).as_deref(),
        Some("https://git.example.org/app/src/Mailer.php#L14")
    );
    let names: Vec<&str> = engine.registry().plugin_names().into_iter().collect();
    assert_eq!(names, vec!["repository", "default"]);
}

#[test]
fn manifest_source_link() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(
        dir.path(),
        "github.toml",
        r#"
[source-link]
file-name = "src-{name}.html"
url = "https://github.com/acme/app/blob/main/{path}#L{line}"
"#,
    );
    let fixture = Fixture::new();
    let engine = fixture.engine(ConfigBuilder::default().plugin(manifest).build(), Vec::new());

    let send = fixture.method("App\\Mailer", "send");
    assert_eq!(
        engine.source_file_name(send).as_deref(),
        Some("src-App.Mailer.html")
    );
    assert_eq!(
        engine.source_url(send).as_deref(),
        Some("https://github.com/acme/app/blob/main/src/Mailer.php#L27")
    );
}

#[test]
fn missing_source_link_is_a_configuration_error() {
    let mut builder = PluginRegistryBuilder::new();
    let recorder = RecordingPlugin::new(&[("see", TagKinds::BLOCK)]);
    assert!(builder.register(PluginDescriptor::new("recorder").with_tags(recorder)));
    assert!(!builder.register(PluginDescriptor::new("nothing")));

    match builder.build() {
        Err(err) => assert!(err.is_configuration()),
        Ok(_) => panic!("registry without a source link must not build"),
    }
}

#[test]
fn broken_plugin_source_fails_engine_setup() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_manifest(dir.path(), "broken.toml", "tags = 3\n");
    let fixture = Fixture::new();

    let result = AnnotationEngine::with_plugins(
        ConfigBuilder::default().plugin(manifest.clone()).build(),
        Vec::new(),
        &fixture.store,
        &fixture.markup,
    );
    match result {
        Err(AnnotationError::PluginLoad { path, .. }) => assert_eq!(path, manifest),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("broken manifest must not load"),
    }
}

#[test]
fn config_file_names_plugin_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("plugins")).unwrap();
    write_manifest(
        &dir.path().join("plugins"),
        "code.toml",
        r#"
name = "code"
[tags.custom]
kinds = ["block"]
template = "<code>{escaped}</code>"
"#,
    );
    fs::write(
        dir.path().join("apidoc.toml"),
        "todo = true\nplugins = [\"plugins\"]\n",
    )
    .unwrap();

    let nested = dir.path().join("src").join("Mail");
    fs::create_dir_all(&nested).unwrap();
    let (config, found) = apidoc::config::load(None, &nested).unwrap();
    assert_eq!(found, Some(dir.path().join("apidoc.toml")));
    assert!(config.todo);

    let fixture = Fixture::new();
    let engine = fixture.engine(config, Vec::new());
    let tags = engine
        .process_block_tags(fixture.class("App\\Mailer"), &[])
        .unwrap();
    assert_eq!(tags["custom"], vec!["<code>&lt;raw&gt; &amp; value</code>"]);
    assert_eq!(tags["todo"], vec!["Retry on failure"]);
}

#[test]
fn default_plugin_rejects_tags_it_does_not_declare() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();
    let plugin = DefaultPlugin::new(engine.config());

    let result = plugin.tag_value("frobnicate", TagKind::Block, "x", &engine.context(None));
    match result {
        Err(AnnotationError::UnsupportedTag(tag)) => assert_eq!(tag, "frobnicate"),
        other => panic!("expected unsupported tag, got {other:?}"),
    }
}
