//! mSpy landing page and pricing plans. Both pages are script-rendered.

use crate::extract::{FieldRule, FieldSchema, Schema};
use crate::feed::{DescriptionTemplate, ItemTemplate, Part, PartStyle};
use crate::traits::fetcher::{FetchStrategy, WaitCondition};

use super::seo::seo_source;
use super::SourceDefinition;

const PLAN_CONTAINER: &str = ".funnel-concept__plans .plan_item";

pub(super) fn home() -> SourceDefinition {
    seo_source(
        "mspy/home",
        "mSpy Home",
        "https://www.mspy.net/",
        FetchStrategy::rendered(WaitCondition::NetworkIdle),
        "mspy:home:data",
        "mSpy Home Page",
        "mspy-seo",
    )
}

pub(super) fn pricing() -> SourceDefinition {
    let fields = FieldSchema::new()
        .field("name", FieldRule::text(".plan_item--period"))
        .field("description", FieldRule::text(".plan_item--description"))
        .field("price", FieldRule::text(".plan_item--price-value"))
        .field("features", FieldRule::text(".plan_item--features_text").multiple());

    let description = DescriptionTemplate::parts(vec![
        Part::new("description", PartStyle::Paragraph),
        Part::labelled("price", "Price"),
        Part::new("features", PartStyle::List),
    ]);

    SourceDefinition {
        id: "mspy/pricing".into(),
        title: "mSpy Pricing".into(),
        link: "https://www.mspy.net/price.html".into(),
        description: None,
        strategy: FetchStrategy::rendered(WaitCondition::selector(PLAN_CONTAINER)),
        schema: Schema::repeating(PLAN_CONTAINER, fields),
        cache_key: "mspy:pricing:plans".into(),
        ttl_secs: 60 * 60 * 12,
        items: ItemTemplate::per_record("mSpy Plan: {name}", "mspy-plan", description),
    }
}
