use apidoc::{AnnotationEngine, Config, Element, MemoryStore, PlainMarkup, ReflectionStore};

use super::helpers::Fixture;

#[test]
fn bare_class_name_resolves_in_current_namespace() {
    let store = MemoryStore::new().with(Element::class("App\\MyClass"));
    let markup = PlainMarkup::new();
    let engine =
        AnnotationEngine::with_plugins(Config::default(), Vec::new(), &store, &markup).unwrap();
    let context = Element::function("App\\boot");

    assert_eq!(
        engine.resolve_link("MyClass", Some(&context)).as_deref(),
        Some("<a href=\"class-App.MyClass.html\">App\\MyClass</a>")
    );
    assert_eq!(
        engine.resolve_link("\\App\\MyClass", None).as_deref(),
        Some("<a href=\"class-App.MyClass.html\">App\\MyClass</a>")
    );
}

#[test]
fn aliases_expand_the_first_segment() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();
    let send = fixture.method("App\\Mailer", "send");

    assert_eq!(
        engine.resolve_link("Smtp", Some(send)).as_deref(),
        Some("<a href=\"class-App.Transport.SmtpTransport.html\">App\\Transport\\SmtpTransport</a>")
    );
}

#[test]
fn members_of_named_classes() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();
    let mailer = fixture.class("App\\Mailer");

    assert_eq!(
        engine.resolve_link("Mailer::send()", Some(mailer)).as_deref(),
        Some("<a href=\"class-App.Mailer.html#_send\">App\\Mailer::send()</a>")
    );
    assert_eq!(
        engine.resolve_link("Mailer->from", Some(mailer)).as_deref(),
        Some("<a href=\"class-App.Mailer.html#$from\">App\\Mailer::$from</a>")
    );
    assert_eq!(
        engine
            .resolve_link("App\\Mailer::DEFAULT_PORT", None)
            .as_deref(),
        Some("<a href=\"class-App.Mailer.html#DEFAULT_PORT\">App\\Mailer::DEFAULT_PORT</a>")
    );
}

#[test]
fn inherited_members_link_to_declaring_class() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();

    assert_eq!(
        engine
            .resolve_link("BulkMailer::send()", Some(fixture.class("App\\BulkMailer")))
            .as_deref(),
        Some("<a href=\"class-App.Mailer.html#_send\">App\\Mailer::send()</a>")
    );
}

#[test]
fn bare_members_resolve_against_the_context_class() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();
    let mailer = fixture.class("App\\Mailer");

    assert_eq!(
        engine.resolve_link("send()", Some(mailer)).as_deref(),
        Some("<a href=\"class-App.Mailer.html#_send\">App\\Mailer::send()</a>")
    );
    assert_eq!(
        engine.resolve_link("$from", Some(mailer)).as_deref(),
        Some("<a href=\"class-App.Mailer.html#$from\">App\\Mailer::$from</a>")
    );
    assert_eq!(engine.resolve_link("send()", None), None);
}

#[test]
fn functions_and_constants() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();
    let mailer = fixture.class("App\\Mailer");

    assert_eq!(
        engine.resolve_link("send_mail", Some(mailer)).as_deref(),
        Some("<a href=\"function-App.send_mail.html\">App\\send_mail</a>")
    );
    assert_eq!(
        engine.resolve_link("VERSION", Some(mailer)).as_deref(),
        Some("<a href=\"constant-App.VERSION.html\">App\\VERSION</a>")
    );
}

#[test]
fn undocumented_classes_do_not_resolve() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();
    let mailer = fixture.class("App\\Mailer");

    assert_eq!(engine.resolve_link("Legacy", Some(mailer)), None);
    assert_eq!(engine.resolve_link("Legacy::run()", Some(mailer)), None);
    assert_eq!(
        engine.doc_line("{@see Legacy::run()}", Some(mailer)).unwrap(),
        "Legacy::run()"
    );
}

#[test]
fn unresolved_see_tag_is_escaped_text() {
    let class = Element::class("App\\Plain").with_annotation("see", "Missing<T> for details");
    let store = MemoryStore::new().with(class.clone());
    let tags = apidoc::process_block_tags(&class, &store, Config::default()).unwrap();
    assert_eq!(tags["see"], vec!["Missing&lt;T&gt; for details"]);
}

#[test]
fn see_with_description_uses_class_separator() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();

    assert_eq!(
        engine
            .doc_line("{@see send_mail the <helper>}", Some(fixture.class("App\\Mailer")))
            .unwrap(),
        "<code><a href=\"function-App.send_mail.html\">App\\send_mail</a></code> the &lt;helper&gt;"
    );
    assert_eq!(
        engine
            .doc_line(
                "{@see send_mail the helper}",
                Some(fixture.method("App\\Mailer", "send"))
            )
            .unwrap(),
        "<code><a href=\"function-App.send_mail.html\">App\\send_mail</a></code><br />the helper"
    );
}

#[test]
fn source_links_point_at_doc_comments() {
    let fixture = Fixture::new();
    let engine = fixture.default_engine();

    let mailer = fixture.class("App\\Mailer");
    assert_eq!(
        engine.source_file_name(mailer).as_deref(),
        Some("source-App.Mailer.html")
    );
    assert_eq!(
        engine.source_url(mailer).as_deref(),
        Some("source-App.Mailer.html#9")
    );
    assert_eq!(
        engine
            .source_url(fixture.method("App\\Mailer", "send"))
            .as_deref(),
        Some("source-App.Mailer.html#27")
    );
    assert_eq!(
        engine
            .source_url(fixture.store.function("App\\send_mail").unwrap())
            .as_deref(),
        Some("source-function-App.send_mail.html#3")
    );
}
