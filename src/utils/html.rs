use anyhow::anyhow;
use scraper::{ElementRef, Selector};

use super::text;

// base
pub trait DOMProcessor<T>: Sync + Send {
    fn process(&self, el: &ElementRef) -> T;
}

pub fn selector(selectors: &str) -> anyhow::Result<Selector> {
    Selector::parse(selectors).map_err(|err| anyhow!("invalid selector '{selectors}': {err}"))
}

// text nodes
#[derive(Default)]
pub struct TextValue {
    pub all_nodes: bool,
}

impl DOMProcessor<String> for TextValue {
    fn process(&self, el: &ElementRef) -> String {
        if self.all_nodes {
            text::sanitize_text(&el.text().collect::<String>())
        } else {
            text::sanitize_text(el.text().next().unwrap_or_default())
        }
    }
}

impl From<TextValue> for Box<dyn DOMProcessor<String>> {
    fn from(value: TextValue) -> Self {
        Box::new(value)
    }
}

impl TextValue {
    pub fn new() -> TextValue {
        TextValue { all_nodes: false }
    }

    pub fn all_nodes(mut self) -> Self {
        self.all_nodes = true;
        self
    }

    pub fn in_scope(self, selectors: &str) -> anyhow::Result<ScopeProcessor<String>> {
        ScopeProcessor::new(selectors, self.into())
    }

    pub fn itr_scope(self, selectors: &str) -> anyhow::Result<ItemsProcessor<String>> {
        ItemsProcessor::new(selectors, self.into())
    }
}

/// Non-blank text of the first element matching `selectors`.
pub fn optional_text_value(
    selectors: &str,
) -> anyhow::Result<Box<dyn DOMProcessor<Option<String>>>> {
    Ok(TextValue::new()
        .all_nodes()
        .in_scope(selectors)?
        .map(|opt| opt.filter(|s| !s.is_empty()))
        .into())
}

/// Non-blank texts of every element matching `selectors`.
pub fn text_values(selectors: &str) -> anyhow::Result<Box<dyn DOMProcessor<Vec<String>>>> {
    Ok(TextValue::new()
        .all_nodes()
        .itr_scope(selectors)?
        .map(|items| items.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>())
        .into())
}

/// First non-blank value among `attrs`, tried in order.
pub struct AttrValue {
    pub attrs: Vec<&'static str>,
}

impl DOMProcessor<Option<String>> for AttrValue {
    fn process(&self, el: &ElementRef) -> Option<String> {
        self.attrs
            .iter()
            .filter_map(|attr| el.attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(String::from)
    }
}

impl From<AttrValue> for Box<dyn DOMProcessor<Option<String>>> {
    fn from(value: AttrValue) -> Self {
        Box::new(value)
    }
}

impl AttrValue {
    pub fn new(attr: &'static str) -> AttrValue {
        AttrValue { attrs: vec![attr] }
    }

    pub fn first_of(attrs: &[&'static str]) -> AttrValue {
        AttrValue {
            attrs: attrs.to_vec(),
        }
    }

    pub fn in_scope(
        self,
        selectors: &str,
    ) -> anyhow::Result<MapValue<Option<Option<String>>, Option<String>>> {
        let scope = ScopeProcessor::<Option<String>>::new(selectors, self.into())?;
        Ok(scope.map(Option::flatten))
    }
}

pub fn optional_attr_value(
    attr: &'static str,
    selectors: &str,
) -> anyhow::Result<Box<dyn DOMProcessor<Option<String>>>> {
    Ok(AttrValue::new(attr).in_scope(selectors)?.into())
}

// transformation
pub struct ExtractValue<Out> {
    pub extract: Box<dyn Fn(&ElementRef) -> Out + Sync + Send>,
}

impl<Out> DOMProcessor<Out> for ExtractValue<Out> {
    fn process(&self, el: &ElementRef) -> Out {
        (self.extract)(el)
    }
}

impl<Out: 'static> From<ExtractValue<Out>> for Box<dyn DOMProcessor<Out>> {
    fn from(value: ExtractValue<Out>) -> Self {
        Box::new(value)
    }
}

impl<Out: 'static> ExtractValue<Out> {
    pub fn new<Extract>(extract: Extract) -> ExtractValue<Out>
    where
        Extract: Fn(&ElementRef) -> Out + Sync + Send + 'static,
    {
        ExtractValue {
            extract: Box::new(extract),
        }
    }

    pub fn itr_scope(self, selectors: &str) -> anyhow::Result<ItemsProcessor<Out>> {
        ItemsProcessor::new(selectors, self.into())
    }
}

pub struct MapValue<In, Out> {
    pub map: Box<dyn Fn(In) -> Out + Sync + Send>,
    pub sub_processor: Box<dyn DOMProcessor<In>>,
}

impl<In, Out> DOMProcessor<Out> for MapValue<In, Out> {
    fn process(&self, el: &ElementRef) -> Out {
        (self.map)(self.sub_processor.process(el))
    }
}

impl<In: 'static, Out: 'static> From<MapValue<In, Out>> for Box<dyn DOMProcessor<Out>> {
    fn from(value: MapValue<In, Out>) -> Self {
        Box::new(value)
    }
}

impl<In: 'static, Out: 'static> MapValue<In, Out> {
    pub fn new<Map>(map: Map, sub_processor: Box<dyn DOMProcessor<In>>) -> MapValue<In, Out>
    where
        Map: Fn(In) -> Out + 'static + Sync + Send,
    {
        MapValue {
            map: Box::new(map),
            sub_processor,
        }
    }

    pub fn map<Map, Next: 'static>(self, map: Map) -> MapValue<Out, Next>
    where
        Map: Fn(Out) -> Next + 'static + Sync + Send,
    {
        MapValue::new(map, self.into())
    }
}

// lists
pub struct ItemsProcessor<Item> {
    pub scope: Selector,
    pub item_processor: Box<dyn DOMProcessor<Item>>,
}

impl<Item> DOMProcessor<Vec<Item>> for ItemsProcessor<Item> {
    fn process(&self, el: &ElementRef) -> Vec<Item> {
        el.select(&self.scope)
            .map(|e| self.item_processor.process(&e))
            .collect()
    }
}

impl<Item: 'static> From<ItemsProcessor<Item>> for Box<dyn DOMProcessor<Vec<Item>>> {
    fn from(value: ItemsProcessor<Item>) -> Self {
        Box::new(value)
    }
}

impl<Item: 'static> ItemsProcessor<Item> {
    pub fn new(
        scope: &str,
        item_processor: Box<dyn DOMProcessor<Item>>,
    ) -> anyhow::Result<ItemsProcessor<Item>> {
        Ok(ItemsProcessor {
            scope: selector(scope)?,
            item_processor,
        })
    }

    pub fn map<Map, Out: 'static>(self, map: Map) -> MapValue<Vec<Item>, Out>
    where
        Map: Fn(Vec<Item>) -> Out + 'static + Sync + Send,
    {
        MapValue::new(map, self.into())
    }
}

// scope
pub struct ScopeProcessor<Item> {
    pub scope: Selector,
    pub item_processor: Box<dyn DOMProcessor<Item>>,
}

impl<Item> DOMProcessor<Option<Item>> for ScopeProcessor<Item> {
    fn process(&self, el: &ElementRef) -> Option<Item> {
        el.select(&self.scope)
            .map(|e| self.item_processor.process(&e))
            .next()
    }
}

impl<Item: 'static> From<ScopeProcessor<Item>> for Box<dyn DOMProcessor<Option<Item>>> {
    fn from(value: ScopeProcessor<Item>) -> Self {
        Box::new(value)
    }
}

impl<Item: 'static> ScopeProcessor<Item> {
    pub fn new(
        scope: &str,
        item_processor: Box<dyn DOMProcessor<Item>>,
    ) -> anyhow::Result<ScopeProcessor<Item>> {
        Ok(ScopeProcessor {
            scope: selector(scope)?,
            item_processor,
        })
    }

    pub fn map<Map, Out: 'static>(self, map: Map) -> MapValue<Option<Item>, Out>
    where
        Map: Fn(Option<Item>) -> Out + 'static + Sync + Send,
    {
        MapValue::new(map, self.into())
    }
}

pub fn process_document<T>(html: &str, processor: &dyn DOMProcessor<T>) -> T {
    let document = scraper::Html::parse_document(html);
    processor.process(&document.root_element())
}

pub fn process_fragment<T>(html: &str, processor: &dyn DOMProcessor<T>) -> T {
    let document = scraper::Html::parse_fragment(html);
    processor.process(&document.root_element())
}
