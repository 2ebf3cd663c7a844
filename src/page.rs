use crate::api::ImageApi;
use crate::fetcher::{load_images, ListingSource};
use crate::links::{propagate, NavLink, Propagation};
use crate::query::{QueryPairs, QueryState};
use crate::render::{render_images, Container, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingPage {
    Grid,
    Links,
}

impl ListingPage {
    pub fn container_id(&self) -> &'static str {
        match self {
            Self::Grid => "image-grid",
            Self::Links => "image-links",
        }
    }

    pub fn template(&self) -> Template {
        match self {
            Self::Grid => Template::card(),
            Self::Links => Template::link(),
        }
    }

    pub fn nav_links(&self) -> Vec<NavLink> {
        match self {
            Self::Grid => vec![NavLink::new("view-links", "View as links", "/images")],
            Self::Links => vec![NavLink::new("view-gallery", "View as gallery", "/gallery")],
        }
    }
}

/// Everything a listing page needs after one load.
#[derive(Debug, Clone)]
pub struct ListingView {
    pub page: ListingPage,
    pub state: QueryState,
    pub container: Container,
    pub links: Vec<NavLink>,
}

/// Fetches, renders and propagates links for a listing page whose query
/// state was already resolved.
pub async fn load_listing<A: ImageApi>(
    api: &A,
    source: ListingSource,
    page: ListingPage,
    query: &QueryPairs,
    state: QueryState,
) -> ListingView {
    let images = load_images(api, source, &state).await;

    let template = page.template();
    let mut container = Container::new(page.container_id());
    render_images(&images, Some(&template), Some(&mut container));

    let mut links = page.nav_links();
    propagate(&mut links, query, &state, Propagation::FullQuery);

    ListingView {
        page,
        state,
        container,
        links,
    }
}

/// Controls on the authorization page; they only carry the username.
pub fn authorization_links(state: &QueryState) -> Vec<NavLink> {
    let mut links = vec![
        NavLink::new("view-btn", "View Gallery", "/gallery"),
        NavLink::new("links-btn", "View Links", "/images"),
        NavLink::new("delete-btn", "Delete Images", "/images"),
    ];
    propagate(&mut links, &QueryPairs::default(), state, Propagation::UsernameOnly);
    links
}
