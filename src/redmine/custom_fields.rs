//! Redmine Custom Fields

use super::api::ResourceApi;
use super::transport::{Method, RawResponse, Transport};
use crate::error::Result;
use crate::resource::{
    resource_def, IndexBy, Listing, Params, QueryParams, ResourceCollection, ResourceId,
};

/// Custom field operations
pub struct CustomFields<T> {
    api: ResourceApi<T>,
}

impl<T: Transport + Clone> CustomFields<T> {
    pub fn new(transport: T) -> Self {
        Self {
            api: ResourceApi::new(transport, resource_def("custom_fields")),
        }
    }

    pub fn with_page_size(self, page_size: u64) -> Self {
        Self {
            api: self.api.with_page_size(page_size),
        }
    }

    pub async fn all(&mut self, params: &QueryParams) -> Result<&ResourceCollection> {
        self.api.all(params).await
    }

    pub async fn listing(
        &mut self,
        force_update: bool,
        params: &QueryParams,
        index_by: IndexBy,
    ) -> Result<Listing> {
        self.api.listing(force_update, params, index_by).await
    }

    pub async fn get_id_by_name(
        &mut self,
        name: &str,
        params: &QueryParams,
    ) -> Result<Option<ResourceId>> {
        self.api.get_id_by_name(name, params).await
    }

    pub fn invalidate(&mut self) {
        self.api.invalidate();
    }

    /// Update a custom field. A `possible_values` list is sent as one
    /// CRLF-separated text value.
    pub async fn update(&self, id: &str, params: Params) -> Result<RawResponse> {
        let params = self.api.prepare(Params::new(), params);
        let path = self.api.def().member_path(id, "xml");
        self.api.send(Method::Put, &path, &params).await
    }
}
