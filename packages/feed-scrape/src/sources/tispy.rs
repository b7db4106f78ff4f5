//! TiSPY landing page and pricing plans.

use crate::extract::{FieldRule, FieldSchema, Schema, Transform};
use crate::feed::{DescriptionTemplate, ItemTemplate, Part, PartStyle};
use crate::traits::fetcher::{FetchStrategy, WaitCondition};

use super::seo::seo_source;
use super::SourceDefinition;

const PLAN_CONTAINER: &str = "#plans .col-md-4";

pub(super) fn home() -> SourceDefinition {
    seo_source(
        "tispy/home",
        "TiSPY SEO Changes",
        "https://tispy.net",
        FetchStrategy::DirectHttp,
        "tispy:seo:content",
        "TiSPY SEO Content Updated",
        "tispy-seo",
    )
}

/// All plans collapse into one "pricing updated" item.
pub(super) fn pricing() -> SourceDefinition {
    let discount = "lable[for=\"d_90\"] b";
    let fields = FieldSchema::new()
        .field("name", FieldRule::text("h2"))
        .field("description", FieldRule::text("p"))
        .field("price_by_month", FieldRule::text(".price span"))
        .field("price", FieldRule::text("font[color=\"red\"] strike"))
        .field("discount_price", FieldRule::text(discount))
        .field("months", FieldRule::text(discount).transform(Transform::DigitsOnly))
        .field("buttons", FieldRule::text(".buttons").multiple())
        .field("button_urls", FieldRule::attr(".buttons", "href").multiple());

    let description = DescriptionTemplate::parts(vec![
        Part::new("name", PartStyle::Heading),
        Part::new("description", PartStyle::Paragraph),
        Part::labelled("price_by_month", "Price per month"),
        Part::labelled("price", "Original price"),
        Part::labelled("discount_price", "Discounted price"),
        Part::labelled("months", "Duration (months)"),
        Part::links("buttons", "button_urls").with_label("Purchase options"),
    ]);

    SourceDefinition {
        id: "tispy/pricing".into(),
        title: "TiSPY Pricing Changes".into(),
        link: "https://www.tispy.net/pricing/".into(),
        description: None,
        strategy: FetchStrategy::rendered(WaitCondition::selector(PLAN_CONTAINER)),
        schema: Schema::repeating(PLAN_CONTAINER, fields),
        cache_key: "tispy:pricing:plans".into(),
        ttl_secs: 60 * 60 * 24,
        items: ItemTemplate::summary("TiSPY Pricing Updated", "tispy-pricing", description)
            .with_summary_heading("Pricing Plans"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::feed::FeedSynthesizer;
    use crate::testing::fixtures;
    use url::Url;

    #[test]
    fn test_pricing_plans_from_fixture() {
        let source = pricing();
        let schema = source.compile().unwrap();
        let base = Url::parse(&source.link).unwrap();

        let extraction = extract(fixtures::TISPY_PRICING, &schema, Some(&base));
        let records = extraction.records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), "Basic");
        assert_eq!(records[0].get("price_by_month"), "9.99");
        assert_eq!(records[0].get("price"), "39.99");
        assert_eq!(records[0].get("months"), "3");
        assert_eq!(records[1].get("buttons"), "Buy Premium, Free Trial");
        assert_eq!(
            records[1].get("button_urls"),
            "https://www.tispy.net/buy/premium, https://www.tispy.net/trial/premium"
        );
    }

    #[test]
    fn test_pricing_is_single_summary_item() {
        let source = pricing();
        let schema = source.compile().unwrap();
        let base = Url::parse(&source.link).unwrap();
        let extraction = extract(fixtures::TISPY_PRICING, &schema, Some(&base));

        let items = FeedSynthesizer::new().build(extraction.records(), &source.link, &source.items);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "TiSPY Pricing Updated");
        assert!(items[0].description.starts_with("<h2>Pricing Plans</h2><h3>Basic</h3>"));
        assert!(items[0].description.contains("<h3>Premium</h3>"));
        assert!(items[0].guid.starts_with("tispy-pricing-"));
    }

    #[test]
    fn test_purchase_options_render_as_links() {
        let source = pricing();
        let schema = source.compile().unwrap();
        let base = Url::parse(&source.link).unwrap();
        let extraction = extract(fixtures::TISPY_PRICING, &schema, Some(&base));

        let premium = source.items.description.render(&extraction.records()[1]);

        assert!(premium.ends_with(
            "<h4>Purchase options</h4><ul>\
             <li><a href=\"https://www.tispy.net/buy/premium\">Buy Premium</a></li>\
             <li><a href=\"https://www.tispy.net/trial/premium\">Free Trial</a></li></ul>"
        ));
    }
}
