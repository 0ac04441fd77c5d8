//! Route classification.
//!
//! Classification is a pure function of the request and the route settings.
//! Checks run in a fixed order and the first match wins:
//! navigation, tool page, image, static asset, anything else.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use easycal_core::RouteConfig;

use super::request::{Destination, FetchRequest, RequestMode};
use crate::fetch::same_origin;

/// Closed set of route classes, one strategy each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    Navigation,
    Tool,
    Image,
    Asset,
    Default,
}

impl RouteClass {
    pub const ALL: [RouteClass; 5] =
        [RouteClass::Navigation, RouteClass::Tool, RouteClass::Image, RouteClass::Asset, RouteClass::Default];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Navigation => "navigation",
            RouteClass::Tool => "tool",
            RouteClass::Image => "image",
            RouteClass::Asset => "asset",
            RouteClass::Default => "default",
        }
    }
}

/// Pick the route class for `request`.
///
/// Returns `None` when the worker must not intercept at all: non-GET methods
/// and requests to another origin go straight to the network.
pub fn classify(request: &FetchRequest, routes: &RouteConfig) -> Option<RouteClass> {
    if !request.is_get() || !same_origin(&request.url, &routes.origin) {
        return None;
    }

    let path = request.url.path();

    let class = if request.mode == RequestMode::Navigate {
        RouteClass::Navigation
    } else if path.contains(&routes.tools_prefix) {
        RouteClass::Tool
    } else if request.destination == Destination::Image {
        RouteClass::Image
    } else if routes.asset_extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
        RouteClass::Asset
    } else {
        RouteClass::Default
    };

    Some(class)
}
