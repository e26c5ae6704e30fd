//! Security group accessor for the NSX policy API
//!
//! # Dry-Run Mode
//!
//! When `dry_run` is true, the client will:
//! - Perform all GET requests (group lookup)
//! - Log the intended PUT/POST payload
//! - **NOT** actually modify the group, reporting status 200 instead

use adminsync_core::{
    Error, GatewayDomain, GroupLookup, GroupStore, MutationOp, MutationStatus, Result,
    SecurityGroup, SessionContext,
};
use async_trait::async_trait;
use serde_json::json;
use std::net::Ipv4Addr;

use crate::{AUTH_HEADER, http_client, policy_base};

/// Group store backed by the NSX policy API
#[derive(Debug)]
pub struct NsxGroupClient {
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT/POST
    dry_run: bool,
}

impl NsxGroupClient {
    pub fn new(dry_run: bool) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            dry_run,
        })
    }

    fn group_url(session: &SessionContext, domain: GatewayDomain, group_name: &str) -> String {
        format!(
            "{}policy/api/v1/infra/domains/{}/groups/{}",
            policy_base(&session.endpoint),
            domain,
            group_name
        )
    }

    /// Send a mutating request, or log it in dry-run mode
    async fn send_mutation(
        &self,
        request: reqwest::RequestBuilder,
        description: &str,
        payload: &serde_json::Value,
    ) -> Result<MutationStatus> {
        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send {} with payload: {}", description, payload);
            return Ok(MutationStatus(200));
        }

        let response = request
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::group_store(format!("{} failed: {}", description, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::warn!("{} returned {}: {}", description, status, error_text);
        }

        Ok(MutationStatus(status.as_u16()))
    }
}

#[async_trait]
impl GroupStore for NsxGroupClient {
    /// ```http
    /// GET policy/api/v1/infra/domains/:gw/groups/:group
    /// csp-auth-token: <session token>
    /// ```
    async fn get_group(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
    ) -> Result<GroupLookup> {
        let url = Self::group_url(session, domain, group_name);
        tracing::debug!("Looking up group: GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, session.token.expose())
            .send()
            .await
            .map_err(|e| Error::group_store(format!("Group lookup failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(GroupLookup::NotFound);
        }
        if !status.is_success() {
            return Ok(GroupLookup::Unexpected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::group_store(format!("Failed to read group response: {}", e)))?;

        match serde_json::from_str::<SecurityGroup>(&body) {
            Ok(group) => Ok(GroupLookup::Found(group)),
            Err(e) => {
                tracing::warn!("Group response for {}/{} did not decode: {}", domain, group_name, e);
                Ok(GroupLookup::Unexpected {
                    status: status.as_u16(),
                })
            }
        }
    }

    /// ```http
    /// PUT policy/api/v1/infra/domains/:gw/groups/:group
    /// {
    ///   "expression": [{ "ip_addresses": [...], "resource_type": "IPAddressExpression" }],
    ///   "id": ":group",
    ///   "display_name": ":group",
    ///   "resource_type": "Group"
    /// }
    /// ```
    async fn create_group(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        seed: &[Ipv4Addr],
    ) -> Result<MutationStatus> {
        let url = Self::group_url(session, domain, group_name);
        let payload = json!({
            "expression": [{
                "ip_addresses": seed.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
                "resource_type": "IPAddressExpression",
            }],
            "id": group_name,
            "display_name": group_name,
            "resource_type": "Group",
        });

        let request = self
            .client
            .put(&url)
            .header(AUTH_HEADER, session.token.expose());

        self.send_mutation(request, &format!("PUT {}", url), &payload)
            .await
    }

    /// ```http
    /// POST policy/api/v1/infra/domains/:gw/groups/:group/ip-address-expressions/:expr?action=add
    /// { "ip_addresses": [...] }
    /// ```
    async fn mutate_group_addresses(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        expression_id: &str,
        addresses: &[Ipv4Addr],
        op: MutationOp,
    ) -> Result<MutationStatus> {
        let url = format!(
            "{}/ip-address-expressions/{}",
            Self::group_url(session, domain, group_name),
            expression_id
        );
        let payload = json!({
            "ip_addresses": addresses.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
        });

        let request = self
            .client
            .post(&url)
            .query(&[("action", op.action())])
            .header(AUTH_HEADER, session.token.expose());

        self.send_mutation(request, &format!("POST {}?action={}", url, op), &payload)
            .await
    }

    fn store_name(&self) -> &'static str {
        "nsx-policy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminsync_core::{MembershipExpression, SessionToken};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GROUP_PATH: &str = "/proxy/policy/api/v1/infra/domains/mgw/groups/Allow-Admin-Access";

    fn session(server: &MockServer) -> SessionContext {
        SessionContext::new(
            SessionToken::new("session-abc"),
            format!("{}/proxy/sks-nsxt-manager", server.uri()),
        )
    }

    fn ip(text: &str) -> Ipv4Addr {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn existing_group_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .and(header(AUTH_HEADER, "session-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "Allow-Admin-Access",
                "display_name": "Allow-Admin-Access",
                "resource_type": "Group",
                "expression": [
                    { "resource_type": "Condition", "key": "Tag", "value": "admin" },
                    {
                        "resource_type": "IPAddressExpression",
                        "id": "expr-1",
                        "ip_addresses": ["1.2.3.4"]
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let lookup = client
            .get_group(&session(&server), GatewayDomain::Management, "Allow-Admin-Access")
            .await
            .unwrap();

        let GroupLookup::Found(group) = lookup else {
            panic!("expected group, got {:?}", lookup);
        };
        assert_eq!(group.expressions.as_ref().unwrap()[0], MembershipExpression::Other);
        let expression = group.ip_address_expression().unwrap();
        assert_eq!(expression.id, "expr-1");
        assert_eq!(expression.ip_addresses, ["1.2.3.4".to_string()]);
    }

    #[tokio::test]
    async fn missing_group_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error_code": 500090,
                "error_message": "Group not found"
            })))
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let lookup = client
            .get_group(&session(&server), GatewayDomain::Management, "Allow-Admin-Access")
            .await
            .unwrap();
        assert_eq!(lookup, GroupLookup::NotFound);
    }

    #[tokio::test]
    async fn other_error_status_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let lookup = client
            .get_group(&session(&server), GatewayDomain::Management, "Allow-Admin-Access")
            .await
            .unwrap();
        assert_eq!(lookup, GroupLookup::Unexpected { status: 403 });
    }

    #[tokio::test]
    async fn undecodable_body_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let lookup = client
            .get_group(&session(&server), GatewayDomain::Management, "Allow-Admin-Access")
            .await
            .unwrap();
        assert_eq!(lookup, GroupLookup::Unexpected { status: 200 });
    }

    #[tokio::test]
    async fn body_without_expression_field_decodes_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "Allow-Admin-Access"
            })))
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let lookup = client
            .get_group(&session(&server), GatewayDomain::Management, "Allow-Admin-Access")
            .await
            .unwrap();
        let GroupLookup::Found(group) = lookup else {
            panic!("expected group, got {:?}", lookup);
        };
        assert!(group.expressions.is_none());
    }

    #[tokio::test]
    async fn create_puts_seeded_group() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/proxy/policy/api/v1/infra/domains/cgw/groups/Allow-Admin-Access"))
            .and(header(AUTH_HEADER, "session-abc"))
            .and(body_json(json!({
                "expression": [{
                    "ip_addresses": ["5.6.7.8"],
                    "resource_type": "IPAddressExpression"
                }],
                "id": "Allow-Admin-Access",
                "display_name": "Allow-Admin-Access",
                "resource_type": "Group"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let status = client
            .create_group(
                &session(&server),
                GatewayDomain::Compute,
                "Allow-Admin-Access",
                &[ip("5.6.7.8")],
            )
            .await
            .unwrap();
        assert_eq!(status, MutationStatus(201));
        assert!(status.is_success());
    }

    #[tokio::test]
    async fn mutations_post_to_action_path() {
        let server = MockServer::start().await;
        for (action, address) in [("add", "5.6.7.8"), ("remove", "1.2.3.4")] {
            Mock::given(method("POST"))
                .and(path(format!("{}/ip-address-expressions/expr-1", GROUP_PATH).as_str()))
                .and(query_param("action", action))
                .and(header(AUTH_HEADER, "session-abc"))
                .and(body_json(json!({ "ip_addresses": [address] })))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = NsxGroupClient::new(false).unwrap();
        let session = session(&server);
        for (op, address) in [(MutationOp::Add, "5.6.7.8"), (MutationOp::Remove, "1.2.3.4")] {
            let status = client
                .mutate_group_addresses(
                    &session,
                    GatewayDomain::Management,
                    "Allow-Admin-Access",
                    "expr-1",
                    &[ip(address)],
                    op,
                )
                .await
                .unwrap();
            assert!(status.is_success());
        }
    }

    #[tokio::test]
    async fn failed_mutation_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(false).unwrap();
        let status = client
            .mutate_group_addresses(
                &session(&server),
                GatewayDomain::Management,
                "Allow-Admin-Access",
                "expr-1",
                &[ip("5.6.7.8")],
                MutationOp::Add,
            )
            .await
            .unwrap();
        assert_eq!(status, MutationStatus(400));
    }

    #[tokio::test]
    async fn dry_run_sends_no_mutations() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(true).unwrap();
        let session = session(&server);

        let created = client
            .create_group(&session, GatewayDomain::Management, "g", &[ip("5.6.7.8")])
            .await
            .unwrap();
        let added = client
            .mutate_group_addresses(
                &session,
                GatewayDomain::Management,
                "g",
                "expr-1",
                &[ip("5.6.7.8")],
                MutationOp::Add,
            )
            .await
            .unwrap();

        assert_eq!(created, MutationStatus(200));
        assert_eq!(added, MutationStatus(200));
    }

    #[tokio::test]
    async fn dry_run_still_performs_lookups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = NsxGroupClient::new(true).unwrap();
        let lookup = client
            .get_group(&session(&server), GatewayDomain::Management, "Allow-Admin-Access")
            .await
            .unwrap();
        assert_eq!(lookup, GroupLookup::NotFound);
    }
}
