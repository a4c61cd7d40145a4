use webbrowser::Browser;

/// WhatsApp share link bragging about `best_score`
pub fn share_url(best_score: u32) -> String {
    format!(
        "https://wa.me/?text=My%20highest%20score%20%3D%20{}%20in%20the%20Christmas%20Nerf%20game!%20%F0%9F%8E%84",
        best_score
    )
}

/// Opens the share link if a browser is around. Returns whether it was opened.
pub fn open_share(best_score: u32) -> bool {
    if !Browser::is_available() {
        log::debug!("no browser available for sharing");
        return false;
    }
    match webbrowser::open(&share_url(best_score)) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("could not open share link: {}", err);
            false
        }
    }
}
