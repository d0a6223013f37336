//! Tests for `RequestBuilder`.

use super::{
    ApiMode, BuildError, FilePart, FormDataEncoder, Params, RequestBuilder, RequestOptions,
    decode_form, headers,
};
use crate::config::{AppInfo, ClientConfig};
use http::Method;
use std::sync::Arc;

fn config() -> Arc<ClientConfig> {
    Arc::new(ClientConfig::builder().api_key("sk_test_123").build())
}

fn builder() -> RequestBuilder {
    RequestBuilder::with_multipart(config(), Arc::new(FormDataEncoder::with_boundary("B")))
}

fn build(
    method: Method,
    path: &str,
    params: &Params,
    options: RequestOptions,
) -> Result<crate::transport::HttpRequest, BuildError> {
    let builder = builder();
    let resolved = options.resolve(builder.config());
    builder.build(&method, path, params, &resolved)
}

mod headers_tests {
    use super::*;

    #[test]
    fn standard_headers_are_present() {
        let request = build(Method::GET, "/v1/charges", &Params::new(), RequestOptions::new())
            .unwrap();

        assert_eq!(request.header("authorization"), Some("Bearer sk_test_123"));
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.header(headers::STRIPE_VERSION), Some("2024-06-20"));
        assert!(
            request
                .header("user-agent")
                .unwrap()
                .starts_with("Stripe/v1 RustBindings/")
        );
        assert!(request.header(headers::IDEMPOTENCY_KEY).is_none());
        assert!(request.header(headers::STRIPE_ACCOUNT).is_none());
    }

    #[test]
    fn client_user_agent_is_json() {
        let request = build(Method::GET, "/v1/charges", &Params::new(), RequestOptions::new())
            .unwrap();

        let ua: serde_json::Value =
            serde_json::from_str(request.header(headers::CLIENT_USER_AGENT).unwrap()).unwrap();
        assert_eq!(ua["lang"], "rust");
        assert_eq!(ua["bindings_version"], super::super::BINDINGS_VERSION);
    }

    #[test]
    fn optional_headers_are_sent_when_set() {
        let options = RequestOptions::new()
            .with_idempotency_key("key-1")
            .with_stripe_account("acct_1");

        let request = build(Method::POST, "/v1/charges", &Params::new(), options).unwrap();

        assert_eq!(request.header(headers::IDEMPOTENCY_KEY), Some("key-1"));
        assert_eq!(request.header(headers::STRIPE_ACCOUNT), Some("acct_1"));
    }

    #[test]
    fn header_overrides_apply_last() {
        let options = RequestOptions::new()
            .with_header("Stripe-Version", "2020-08-27")
            .with_header("X-Custom", "yes");

        let request = build(Method::GET, "/v1/charges", &Params::new(), options).unwrap();

        assert_eq!(request.header(headers::STRIPE_VERSION), Some("2020-08-27"));
        assert_eq!(request.header("x-custom"), Some("yes"));
    }

    #[test]
    fn app_info_is_appended_to_user_agent() {
        let config = Arc::new(
            ClientConfig::builder()
                .api_key("sk_test_123")
                .app_info(
                    AppInfo::new("MyPlugin")
                        .with_version("1.2.3")
                        .with_url("https://myplugin.example"),
                )
                .build(),
        );
        let builder = RequestBuilder::new(config);
        let resolved = RequestOptions::new().resolve(builder.config());

        let request = builder
            .build(&Method::GET, "/v1/charges", &Params::new(), &resolved)
            .unwrap();

        assert!(
            request
                .header("user-agent")
                .unwrap()
                .ends_with(" MyPlugin/1.2.3 (https://myplugin.example)")
        );
        let ua: serde_json::Value =
            serde_json::from_str(request.header(headers::CLIENT_USER_AGENT).unwrap()).unwrap();
        assert_eq!(ua["application"]["name"], "MyPlugin");
    }
}

mod errors {
    use super::*;

    #[test]
    fn missing_api_key_is_rejected() {
        let builder = RequestBuilder::new(Arc::new(ClientConfig::default()));
        let resolved = RequestOptions::new().resolve(builder.config());

        let result = builder.build(&Method::GET, "/v1/charges", &Params::new(), &resolved);

        assert_eq!(result.unwrap_err(), BuildError::MissingApiKey);
    }

    #[test]
    fn whitespace_in_api_key_is_rejected() {
        let options = RequestOptions::new().with_api_key("sk_test 123");

        let result = build(Method::GET, "/v1/charges", &Params::new(), options);

        assert_eq!(result.unwrap_err(), BuildError::InvalidApiKey);
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let options = RequestOptions::new().with_stripe_account("acct\n1");

        let result = build(Method::GET, "/v1/charges", &Params::new(), options);

        assert!(matches!(result, Err(BuildError::InvalidHeader { .. })));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let options = RequestOptions::new().with_header("bad header", "x");

        let result = build(Method::GET, "/v1/charges", &Params::new(), options);

        assert!(matches!(result, Err(BuildError::InvalidHeader { .. })));
    }
}

mod encoding {
    use super::*;

    fn params() -> Params {
        Params::new()
            .with("limit", 3)
            .with("created", Params::new().with("gte", 1_700_000_000))
    }

    #[test]
    fn get_params_go_to_query_string() {
        let request = build(Method::GET, "/v1/charges", &params(), RequestOptions::new()).unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://api.stripe.com/v1/charges?limit=3&created[gte]=1700000000"
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn delete_params_go_to_query_string() {
        let request =
            build(Method::DELETE, "/v1/customers/cus_1", &params(), RequestOptions::new())
                .unwrap();

        assert_eq!(request.url.query(), Some("limit=3&created[gte]=1700000000"));
        assert!(request.body.is_none());
    }

    #[test]
    fn post_params_go_to_form_body() {
        let request = build(Method::POST, "/v1/charges", &params(), RequestOptions::new()).unwrap();

        assert!(request.url.query().is_none());
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        assert_eq!(body, "limit=3&created[gte]=1700000000");
    }

    #[test]
    fn post_round_trips_through_decode() {
        let params = Params::new()
            .with("amount", 500)
            .with("metadata", Params::new().with("k", "v w"))
            .with("items", vec![Params::new().with("price", "p_1")]);

        let request = build(Method::POST, "/v1/orders", &params, RequestOptions::new()).unwrap();
        let body = String::from_utf8(request.body.unwrap()).unwrap();

        assert_eq!(decode_form(&body).unwrap(), params.stringified());
    }

    #[test]
    fn get_round_trips_through_decode() {
        let params = params();

        let request = build(Method::GET, "/v1/charges", &params, RequestOptions::new()).unwrap();

        assert_eq!(
            decode_form(request.url.query().unwrap()).unwrap(),
            params.stringified()
        );
    }

    #[test]
    fn file_param_switches_to_multipart() {
        let params = Params::new()
            .with("purpose", "dispute_evidence")
            .with("file", FilePart::new("a.txt", "hello"));

        let request = build(Method::POST, "/v1/files", &params, RequestOptions::new()).unwrap();

        assert_eq!(
            request.header("content-type"),
            Some("multipart/form-data; boundary=B")
        );
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        assert!(body.contains("filename=\"a.txt\""));
    }

    #[test]
    fn preview_mode_sends_json() {
        let options = RequestOptions::new().with_api_mode(ApiMode::Preview);

        let request = build(Method::POST, "/v2/things", &params(), options).unwrap();

        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(&request.body.unwrap()).unwrap();
        assert_eq!(body["limit"], 3);
        assert_eq!(body["created"]["gte"], 1_700_000_000);
    }

    #[test]
    fn base_path_prefix_is_kept() {
        for base in ["https://gw.example/stripe/", "https://gw.example/stripe"] {
            let config = ClientConfig::builder()
                .api_key("sk_test_123")
                .api_base(url::Url::parse(base).unwrap())
                .build();
            let builder = RequestBuilder::new(Arc::new(config));
            let resolved = RequestOptions::new().resolve(builder.config());

            let request = builder
                .build(&Method::GET, "/v1/customers", &Params::new(), &resolved)
                .unwrap();

            assert_eq!(request.url.as_str(), "https://gw.example/stripe/v1/customers");
        }
    }

    #[test]
    fn origin_only_base_joins_path() {
        let request = build(Method::GET, "/v1/charges", &Params::new(), RequestOptions::new())
            .unwrap();

        assert_eq!(request.url.as_str(), "https://api.stripe.com/v1/charges");
    }

    #[test]
    fn same_inputs_build_same_request() {
        let options = RequestOptions::new().with_idempotency_key("k");

        let first = build(Method::POST, "/v1/charges", &params(), options.clone()).unwrap();
        let second = build(Method::POST, "/v1/charges", &params(), options).unwrap();

        assert_eq!(first.url, second.url);
        assert_eq!(first.headers, second.headers);
        assert_eq!(first.body, second.body);
    }
}
