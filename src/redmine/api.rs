//! Operations shared by every resource type

use super::transport::{Method, RawResponse, Transport};
use crate::error::{Result, ValidationError};
use crate::resource::{
    CollectionFetcher, IndexBy, Listing, Params, PayloadBuilder, QueryParams, ResourceCollection,
    ResourceDef, ResourceId,
};

/// Listing, lookup and write plumbing for one resource type
pub struct ResourceApi<T> {
    transport: T,
    def: &'static ResourceDef,
    fetcher: CollectionFetcher<T>,
}

impl<T: Transport + Clone> ResourceApi<T> {
    pub fn new(transport: T, def: &'static ResourceDef) -> Self {
        Self {
            fetcher: CollectionFetcher::for_resource(transport.clone(), def),
            transport,
            def,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.fetcher = self.fetcher.with_page_size(page_size);
        self
    }

    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn fetcher(&self) -> &CollectionFetcher<T> {
        &self.fetcher
    }

    /// Fetch every record and refresh the cached listing
    pub async fn all(&mut self, params: &QueryParams) -> Result<&ResourceCollection> {
        Ok(self.fetcher.all(params).await?)
    }

    pub async fn listing(
        &mut self,
        force_update: bool,
        params: &QueryParams,
        index_by: IndexBy,
    ) -> Result<Listing> {
        Ok(self.fetcher.listing(force_update, params, index_by).await?)
    }

    pub async fn get_id_by_name(&mut self, name: &str, params: &QueryParams) -> Result<Option<ResourceId>> {
        Ok(self.fetcher.get_id_by_name(name, params).await?)
    }

    pub fn invalidate(&mut self) {
        self.fetcher.invalidate();
    }

    /// Lay caller params over the resource defaults and drop blanks.
    /// `leading` fields come first, then the defaults, then any other caller
    /// fields in the order given.
    pub fn prepare(&self, leading: Params, params: Params) -> Params {
        let builder = PayloadBuilder::new(self.def);
        let mut defaults = leading;
        for (name, value) in builder.defaults().iter() {
            if defaults.get(name).is_none() {
                defaults.set(name, value.clone());
            }
        }
        params.merged_over(defaults).without_blanks()
    }

    /// Refuse the write when a field required on create is missing
    pub fn validate_create(&self, params: &Params) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .def
            .required_fields()
            .filter(|name| !params.has_value(name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields {
                resource: self.def.root_element.clone(),
                missing,
            })
        }
    }

    /// Build the document for `params` and send it. A field name that cannot
    /// be an element name fails before the request.
    pub async fn send(&self, method: Method, path: &str, params: &Params) -> Result<RawResponse> {
        let xml = PayloadBuilder::new(self.def).build(params)?.to_xml();
        tracing::debug!("{} {} payload: {} fields", method, path, params.len());
        Ok(self.transport.perform(method, path, Some(xml)).await?)
    }

    pub async fn delete(&self, path: &str) -> Result<RawResponse> {
        Ok(self.transport.perform(Method::Delete, path, None).await?)
    }

    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let response = self.transport.perform(Method::Get, path, None).await?;
        Ok(response.json()?)
    }
}
