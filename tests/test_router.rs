use lantern::http::request::{Method, Request, RequestBuilder};
use lantern::http::response::Response;
use lantern::router::{Params, Pattern, RouteError, Router};

fn get(path: &str) -> Request {
    RequestBuilder::new()
        .method(Method::GET)
        .path(path)
        .build()
        .unwrap()
}

fn body_of(response: &Response) -> String {
    String::from_utf8_lossy(response.body.as_bytes()).into_owned()
}

fn labelled(label: &'static str) -> impl Fn(&Params, &Request) -> anyhow::Result<Response> {
    move |_params, _req| Ok(Response::ok(label))
}

#[test]
fn test_router_creation() {
    let router = Router::new();
    assert!(router.is_empty());
    assert!(router.find("/").is_none());
}

#[test]
fn test_first_registered_match_wins() {
    let mut router = Router::new();
    router.register("/a", labelled("first")).unwrap();
    router.register("/a/<id>", labelled("second")).unwrap();

    let (route, params) = router.find("/a").unwrap();
    assert_eq!(route.pattern().as_str(), "/a");
    assert!(params.is_empty());

    let (route, params) = router.find("/a/5").unwrap();
    assert_eq!(route.pattern().as_str(), "/a/<id>");
    assert_eq!(params["id"], "5");
}

#[test]
fn test_registration_order_decides_overlaps() {
    let mut router = Router::new();
    router.register("/user/<id>", labelled("dynamic")).unwrap();
    router.register("/user/me", labelled("literal")).unwrap();

    let (route, params) = router.find("/user/me").unwrap();
    let response = route.call(&params, &get("/user/me")).unwrap();
    assert_eq!(body_of(&response), "dynamic");
}

#[test]
fn test_matching_is_anchored() {
    let mut router = Router::new();
    router.register("/a/<id>", labelled("a")).unwrap();

    assert!(router.find("/a").is_none());
    assert!(router.find("/a/").is_none());
    assert!(router.find("/a/1/2").is_none());
    assert!(router.find("/x/a/1").is_none());
    assert!(router.find("/a/1").is_some());
}

#[test]
fn test_trailing_slash_is_significant() {
    let mut router = Router::new();
    router.register("/about", labelled("about")).unwrap();

    assert!(router.find("/about").is_some());
    assert!(router.find("/about/").is_none());
}

#[test]
fn test_multiple_placeholders() {
    let mut router = Router::new();
    router
        .register("/users/<user_id>/posts/<post_id>", labelled("post"))
        .unwrap();

    let (_, params) = router.find("/users/alice/posts/17").unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params["user_id"], "alice");
    assert_eq!(params["post_id"], "17");
}

#[test]
fn test_handler_receives_params_and_request() {
    let mut router = Router::new();
    router
        .register("/user/<id>", |params, req| {
            Ok(Response::ok(format!(
                "User {} via {}",
                params["id"], req.method
            )))
        })
        .unwrap();

    let (route, params) = router.find("/user/42").unwrap();
    let response = route.call(&params, &get("/user/42")).unwrap();
    assert_eq!(body_of(&response), "User 42 via GET");
}

#[test]
fn test_handler_errors_are_returned() {
    let mut router = Router::new();
    router
        .register("/boom", |_params, _req| anyhow::bail!("database unavailable"))
        .unwrap();

    let (route, params) = router.find("/boom").unwrap();
    assert!(route.call(&params, &get("/boom")).is_err());
}

#[test]
fn test_invalid_patterns_rejected() {
    assert_eq!(
        Pattern::parse("user").unwrap_err(),
        RouteError::MissingLeadingSlash("user".to_string())
    );
    assert!(matches!(
        Pattern::parse("/user/<>"),
        Err(RouteError::MalformedSegment { .. })
    ));
    assert!(matches!(
        Pattern::parse("/user/<id"),
        Err(RouteError::MalformedSegment { .. })
    ));
    assert!(matches!(
        Pattern::parse("/user/<bad-name>"),
        Err(RouteError::MalformedSegment { .. })
    ));
    assert!(matches!(
        Pattern::parse("/<id>/<id>"),
        Err(RouteError::DuplicatePlaceholder { .. })
    ));

    let mut router = Router::new();
    assert!(router.register("nope", labelled("x")).is_err());
    assert!(router.is_empty());
}

#[test]
fn test_patterns_listed_in_order() {
    let mut router = Router::new();
    router
        .register("/", labelled("root"))
        .unwrap()
        .register("/search", labelled("search"))
        .unwrap();

    let patterns: Vec<&str> = router.patterns().collect();
    assert_eq!(patterns, vec!["/", "/search"]);
    assert_eq!(router.len(), 2);
}
