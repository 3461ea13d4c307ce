use firm_scrape::strategy::team_page::find_team_page;
use firm_scrape::{
    CrawlJob, DomTree, FirmCategory, JobStatus, NameOracle, Orchestrator, Page, ProfileLimit, ScrapeConfig,
    ScrapeError, StaticSite,
};
use url::Url;

const NAMES: &[&str] = &[
    "jane", "doe", "john", "smith", "mary", "brown", "anna", "jones", "paul", "green", "ruth", "white", "mark",
    "black", "lucy", "stone",
];

const PEOPLE: &[&str] = &[
    "Jane Doe",
    "John Smith",
    "Mary Brown",
    "Anna Jones",
    "Paul Green",
    "Ruth White",
    "Mark Black",
    "Lucy Stone",
];

fn oracle() -> NameOracle {
    NameOracle::new(NAMES)
}

fn orchestrator(sitemap: Vec<Url>) -> Orchestrator {
    Orchestrator::new(ScrapeConfig::default().without_waits(), Box::new(sitemap))
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn grid(people: &[&str]) -> String {
    let cards: String = people
        .iter()
        .map(|name| {
            let slug = name.to_lowercase().replace(' ', ".");
            format!(
                r#"<div class="card member"><h3>{}</h3><p>Partner</p><a href="mailto:{}@firm.test">Email</a></div>"#,
                name, slug
            )
        })
        .collect();
    format!(r#"<div class="grid">{}</div>"#, cards)
}

fn document(body: &str) -> String {
    format!(
        r#"<html><head><title>Firm</title><script>var x = "<div>";</script></head><body>
            <nav><a href="/">Home</a><a href="/contact">Contact</a></nav>
            {}
        </body></html>"#,
        body
    )
}

fn homepage() -> String {
    document(r#"<a href="/about">About</a><a href="/our-team">Our Team</a>"#)
}

#[test]
fn test_scenario_team_page_located() {
    let tree = DomTree::from_html(&document(r#"<a href="/our-team">Team</a>"#));
    let found = find_team_page(&tree, &url("https://domain.test/"), FirmCategory::Law).unwrap();
    assert_eq!(found.as_str(), "https://domain.test/our-team");
}

#[test]
fn test_investment_job_without_filters() {
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", homepage())
        .with_page("http://firm.test/our-team", document(&grid(&PEOPLE[..3])));

    let job = CrawlJob::new("firm.test", FirmCategory::Investment, ProfileLimit::unbounded());
    let report = orchestrator(vec![]).run(&mut site, &oracle(), job);

    assert_eq!(report.job.status(), JobStatus::Completed);
    assert_eq!(report.job.team_url.as_ref().map(Url::as_str), Some("http://firm.test/our-team"));
    assert_eq!(report.job.count(), 3);
    assert_eq!(report.job.fail_reason(), "N/A");

    let names: Vec<&str> = report.profiles.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, vec!["Jane Doe", "John Smith", "Mary Brown"]);
    assert!(report.profiles.iter().all(|p| p.is_key && !p.is_invalid));
    assert_eq!(report.profiles[1].joined_emails(), "mailto:john.smith@firm.test");

    // homepage, team page; a single unfiltered pass
    assert_eq!(site.history().len(), 2);
}

#[test]
fn test_limit_of_five_on_eight_cards() {
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", homepage())
        .with_page("http://firm.test/our-team", document(&grid(PEOPLE)));

    let job = CrawlJob::new("firm.test", FirmCategory::Investment, ProfileLimit::bounded(5).unwrap());
    let report = orchestrator(vec![]).run(&mut site, &oracle(), job);

    assert_eq!(report.job.status(), JobStatus::Completed);
    assert_eq!(report.profiles.len(), 5);
    assert_eq!(report.job.count(), 5);
    assert_eq!(report.profiles[4].name.as_deref(), Some("Paul Green"));
}

#[test]
fn test_law_filters_across_paginated_results() {
    let team = document(
        r#"<form>
            <select name="practice"><option>All practices</option><option>Tax</option><option>Litigation</option></select>
            <select name="office"><option>London</option><option>Paris</option></select>
            <button type="submit" class="search">Find</button>
        </form>"#,
    );
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", homepage())
        .with_page("http://firm.test/our-team", team)
        .with_page(
            "http://firm.test/our-team?practice=Tax",
            document(&format!(r#"{}<a href="/our-team?practice=Tax&page=2">2</a>"#, grid(&PEOPLE[..2]))),
        )
        .with_page("http://firm.test/our-team?practice=Tax&page=2", document(&grid(&PEOPLE[2..4])))
        .with_page("http://firm.test/our-team?practice=Litigation", document(&grid(&PEOPLE[4..6])));

    let job = CrawlJob::new("firm.test", FirmCategory::Law, ProfileLimit::unbounded());
    let report = orchestrator(vec![]).run(&mut site, &oracle(), job);

    assert_eq!(report.job.status(), JobStatus::Completed);
    let names: Vec<&str> = report.profiles.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, PEOPLE[..6].to_vec());
    assert_eq!(report.job.count(), 6);
}

#[test]
fn test_fallback_to_sitemap_keeps_first_error() {
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", document(r#"<a href="/about">About</a>"#))
        .with_page(
            "http://firm.test/people/jane-doe",
            document("<h1>Jane Doe</h1><p>Managing Director</p><a href=\"https://www.linkedin.com/in/janedoe\">in</a>"),
        );

    let job = CrawlJob::new("firm.test", FirmCategory::Investment, ProfileLimit::unbounded());
    let sitemap = vec![url("http://firm.test/about"), url("http://firm.test/people/jane-doe")];
    let report = orchestrator(sitemap).run(&mut site, &oracle(), job);

    assert_eq!(report.job.status(), JobStatus::Completed);
    assert_eq!(report.job.fail_reason(), ScrapeError::TeamPageNotFound.to_string());
    assert_eq!(report.profiles.len(), 1);
    let profile = &report.profiles[0];
    assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
    assert!(profile.is_key);
    assert_eq!(profile.joined_linkedins(), "https://www.linkedin.com/in/janedoe");
    assert_eq!(profile.source_url.as_str(), "http://firm.test/people/jane-doe");
}

#[test]
fn test_both_strategies_failing_fails_the_job() {
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", homepage())
        .with_page("http://firm.test/our-team", document("<p>Coming soon</p>"));

    let job = CrawlJob::new("firm.test", FirmCategory::Investment, ProfileLimit::unbounded());
    let report = orchestrator(vec![]).run(&mut site, &oracle(), job);

    assert_eq!(report.job.status(), JobStatus::Failed);
    assert_eq!(
        report.job.fail_reason(),
        ScrapeError::InsufficientNames { found: 0 }.to_string()
    );
    assert!(report.profiles.is_empty());
    assert!(report.job.finished_at.is_some());
}

#[test]
fn test_report_serializes_joined_contacts() {
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", homepage())
        .with_page("http://firm.test/our-team", document(&grid(&PEOPLE[..2])));

    let job = CrawlJob::new("firm.test", FirmCategory::Investment, ProfileLimit::unbounded());
    let report = orchestrator(vec![]).run(&mut site, &oracle(), job);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["job"]["status"], "Completed");
    assert_eq!(json["job"]["category"], "INVESTMENT");
    assert_eq!(json["profiles"][0]["emails"], "mailto:jane.doe@firm.test");
    assert_eq!(json["profiles"][0]["others"], "");
}

#[test]
fn test_page_is_left_on_team_results() {
    let mut site = StaticSite::new()
        .with_page("http://firm.test/", homepage())
        .with_page("http://firm.test/our-team", document(&grid(&PEOPLE[..2])));
    let job = CrawlJob::new("firm.test", FirmCategory::Investment, ProfileLimit::unbounded());
    orchestrator(vec![]).run(&mut site, &oracle(), job);
    assert_eq!(site.current_url().unwrap().as_str(), "http://firm.test/our-team");
    assert_eq!(site.open_tabs(), 1);
}
