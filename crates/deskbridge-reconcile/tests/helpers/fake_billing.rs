//! Paged in-memory billing customer list.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use deskbridge_billing::{
    BillingApi, BillingError, BillingResult, CustomerFilter, CustomerPage, CustomerRecord,
};

pub struct FakeBilling {
    customers: Vec<CustomerRecord>,
    page_size: usize,
    fail_on_page: Option<usize>,
    requested_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeBilling {
    pub fn new(customers: Vec<CustomerRecord>, page_size: usize) -> Self {
        Self {
            customers,
            page_size,
            fail_on_page: None,
            requested_tokens: Mutex::new(Vec::new()),
        }
    }

    /// Fail the listing of the given zero-based page.
    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn requested_tokens(&self) -> Vec<Option<String>> {
        self.requested_tokens.lock().unwrap().clone()
    }
}

pub fn customer(id: &str, email: &str, first: &str, last: &str, phone: &str) -> CustomerRecord {
    CustomerRecord {
        id: id.to_string(),
        email: email.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        phone: phone.to_string(),
    }
}

#[async_trait]
impl BillingApi for FakeBilling {
    async fn get_customer(&self, id: &str) -> BillingResult<CustomerRecord> {
        self.customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| BillingError::NotFound(id.to_string()))
    }

    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page_token: Option<&str>,
    ) -> BillingResult<CustomerPage> {
        self.requested_tokens
            .lock()
            .unwrap()
            .push(page_token.map(str::to_string));

        let page: usize = page_token.map_or(0, |t| t.parse().unwrap());
        if self.fail_on_page == Some(page) {
            return Err(BillingError::Api {
                status: 500,
                detail: "listing failed".to_string(),
            });
        }

        let matching: Vec<_> = self
            .customers
            .iter()
            .filter(|c| filter.email.as_ref().map_or(true, |e| &c.email == e))
            .cloned()
            .collect();
        let start = page * self.page_size;
        let end = (start + self.page_size).min(matching.len());
        let next_page_token = (end < matching.len()).then(|| (page + 1).to_string());

        Ok(CustomerPage {
            customers: matching.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
            next_page_token,
        })
    }
}
