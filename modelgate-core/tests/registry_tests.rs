//! Capability registry behavior across the whole model table

use modelgate_core::registry::{
    CapabilityRegistry, DimensionSupport, Modality, ProviderKind,
};
use test_case::test_case;

#[test_case("amazon.titan-embed-text-v1", ProviderKind::TitanEmbed)]
#[test_case("amazon.titan-embed-text-v2:0", ProviderKind::TitanEmbed)]
#[test_case("amazon.titan-embed-image-v1", ProviderKind::TitanEmbed)]
#[test_case("cohere.embed-english-v3", ProviderKind::CohereEmbed)]
#[test_case("cohere.embed-multilingual-v3", ProviderKind::CohereEmbed)]
#[test_case("cohere.embed-v4:0", ProviderKind::CohereEmbed)]
#[test_case("twelvelabs.marengo-embed-2-7-v1:0", ProviderKind::MarengoEmbed)]
#[test_case("amazon.nova-2-multimodal-embeddings-v1:0", ProviderKind::NovaEmbed)]
#[test_case("amazon.titan-image-generator-v1", ProviderKind::TitanImage)]
#[test_case("amazon.titan-image-generator-v2:0", ProviderKind::TitanImage)]
#[test_case("amazon.nova-canvas-v1:0", ProviderKind::NovaCanvas)]
#[test_case("stability.stable-image-core-v1:1", ProviderKind::Stability)]
#[test_case("stability.sd3-5-large-v1:0", ProviderKind::Stability)]
#[test_case("stability.stable-image-ultra-v1:1", ProviderKind::Stability)]
#[test_case("amazon.transcribe", ProviderKind::Translation)]
fn known_models_resolve_to_their_family(model_id: &str, expected: ProviderKind) {
    let registry = CapabilityRegistry::builtin();
    let capability = registry.lookup(model_id).unwrap();
    assert_eq!(capability.provider, expected);
}

#[test]
fn unknown_models_resolve_to_none_not_panic() {
    let registry = CapabilityRegistry::builtin();
    for model_id in [
        "",
        "gpt-4o",
        "amazon",
        "amazon.titan",
        "cohere",
        "stability",
        "a.very.long.model.identifier.that.matches.nothing",
    ] {
        assert!(registry.lookup(model_id).is_none(), "model {model_id:?}");
    }
}

#[test]
fn dimension_support_varies_by_family() {
    let registry = CapabilityRegistry::builtin();
    assert_eq!(
        registry.lookup("amazon.titan-embed-text-v1").unwrap().dimensions,
        DimensionSupport::None
    );
    assert_eq!(
        registry
            .lookup("amazon.nova-2-multimodal-embeddings-v1:0")
            .unwrap()
            .dimensions,
        DimensionSupport::FixedSet(&[256, 384, 1024, 3072])
    );
    assert_eq!(
        registry.lookup("cohere.embed-v4:0").unwrap().dimensions,
        DimensionSupport::Arbitrary
    );
}

#[test]
fn multimodal_support_varies_by_family() {
    let registry = CapabilityRegistry::builtin();
    let marengo = registry.lookup("twelvelabs.marengo-embed-2-7-v1:0").unwrap();
    assert!(marengo.supports_input(Modality::Video));
    assert!(marengo.supports_input(Modality::Audio));

    let titan_text = registry.lookup("amazon.titan-embed-text-v2:0").unwrap();
    assert!(titan_text.supports_input(Modality::Text));
    assert!(!titan_text.supports_input(Modality::Image));

    let cohere = registry.lookup("cohere.embed-v4:0").unwrap();
    assert!(cohere.supports_input(Modality::Image));
    assert!(!cohere.supports_input(Modality::Video));
}

#[test]
fn only_the_titan_multimodal_family_auto_combines() {
    let registry = CapabilityRegistry::builtin();
    let combining: Vec<&str> = registry
        .matchers()
        .filter(|matcher| {
            registry
                .lookup(matcher)
                .is_some_and(|capability| capability.auto_combines_text_image)
        })
        .collect();
    assert_eq!(combining, vec!["amazon.titan-embed-image-v1"]);
}

#[test]
fn truncate_support_matches_the_provider_contracts() {
    let registry = CapabilityRegistry::builtin();
    assert!(registry.lookup("cohere.embed-v4:0").unwrap().supports_truncate);
    assert!(
        registry
            .lookup("twelvelabs.marengo-embed-2-7-v1:0")
            .unwrap()
            .supports_truncate
    );
    assert!(
        !registry
            .lookup("amazon.titan-embed-text-v2:0")
            .unwrap()
            .supports_truncate
    );
}
