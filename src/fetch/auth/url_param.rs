use crate::fetch::client::{HttpClient, HttpResponse, TransportError};

/// An [`HttpClient`] wrapper that appends a fixed query parameter.
///
/// Every resource endpoint needs `$format=JSON`; [`UrlParam::json_format`]
/// builds that wrapper.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub value: String,
}

impl<C> UrlParam<C> {
    pub fn json_format(inner: C) -> Self {
        Self {
            inner,
            param_name: "$format".to_string(),
            value: "JSON".to_string(),
        }
    }
}

impl<C: HttpClient> HttpClient for UrlParam<C> {
    fn execute(
        &self,
        mut req: reqwest::blocking::Request,
    ) -> Result<HttpResponse, TransportError> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.value);
        self.inner.execute(req)
    }
}
