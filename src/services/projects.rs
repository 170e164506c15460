use crate::error::AppError;
use crate::models::{Developer, Project, ProjectsData};
use csv::StringRecord;
use reqwest::Client;
use std::collections::{HashMap, HashSet};

/// Downloads and parses the developer/project list. Failures are returned
/// once; callers decide whether to try again.
pub async fn fetch_projects(url: &str) -> Result<ProjectsData, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Fetching projects from CSV...");

    let response = Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Remote(format!("Failed to fetch CSV: {}", e)))?;

    if !response.status().is_success() {
        tracing::error!("Failed to fetch CSV: {}", response.status());
        return Err(AppError::Remote(format!(
            "Failed to fetch CSV. Status: {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Remote(format!("Failed to read CSV body: {}", e)))?;

    let data = parse_projects_csv(&body)?;
    tracing::info!(
        "Extracted {} developers and {} projects in {:?}",
        data.developers.len(),
        data.projects.len(),
        start.elapsed()
    );
    Ok(data)
}

pub fn parse_projects_csv(body: &str) -> Result<ProjectsData, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::Remote("Empty CSV response".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let columns: HashMap<String, usize> = reader
        .headers()
        .map_err(|e| AppError::Remote(format!("Failed to parse CSV headers: {}", e)))?
        .iter()
        .enumerate()
        .map(|(idx, header)| (strip_quotes(header.trim()).to_string(), idx))
        .collect();

    let mut projects = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV record {}: {}", line + 1, e);
                continue;
            }
        };
        let value = |name: &str| field(&columns, &record, name).to_string();
        let flag = |name: &str| value(name).trim().eq_ignore_ascii_case("true");

        projects.push(Project {
            id: value("project_id"),
            name: strip_quotes(&value("Project Name")).to_string(),
            developer_id: value("developer_id"),
            developer_name: strip_quotes(&value("Developer Name")).to_string(),
            is_super: flag("is_super"),
            fake: flag("fake"),
            not_launched: flag("not_launched"),
        });
    }

    let mut seen = HashSet::new();
    let developers = projects
        .iter()
        .filter(|p| !p.developer_id.is_empty() && seen.insert(p.developer_id.clone()))
        .map(|p| Developer {
            id: p.developer_id.clone(),
            name: p.developer_name.clone(),
        })
        .collect();

    Ok(ProjectsData {
        developers,
        projects,
    })
}

fn field<'a>(columns: &HashMap<String, usize>, record: &'a StringRecord, name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&idx| record.get(idx))
        .unwrap_or("")
}

/// Removes one leading and one trailing double quote.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

pub fn projects_by_developers(projects: &[Project], developer_ids: &[String]) -> Vec<Project> {
    if developer_ids.is_empty() {
        return Vec::new();
    }
    projects
        .iter()
        .filter(|p| developer_ids.contains(&p.developer_id))
        .cloned()
        .collect()
}

/// Display label for a project id; unknown ids are returned unchanged.
pub fn project_label(projects: &[Project], id: &str) -> String {
    projects
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Id-to-name lookup for the projects that take part in a merge.
pub fn project_labels(projects: &[Project], ids: &[String]) -> HashMap<String, String> {
    ids.iter()
        .map(|id| (id.clone(), project_label(projects, id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "project_id,\"Project Name\", developer_id ,Developer Name,is_super,fake,not_launched\n\
p1,Palm Hills,d1,Acme Dev,TRUE,false,False\n\
\n\
p2,\"Lake View\",d2,Beta Homes,false,TRUE,true\n\
p3,Sky Towers,d1,Acme Dev,,,\n\
p4,Orphan,,,,,\n";

    #[test]
    fn test_parse_projects_csv() {
        let data = parse_projects_csv(CSV).unwrap();
        assert_eq!(data.projects.len(), 4);

        let first = &data.projects[0];
        assert_eq!(first.name, "Palm Hills");
        assert_eq!(first.developer_id, "d1");
        assert!(first.is_super && !first.fake && !first.not_launched);

        let second = &data.projects[1];
        assert_eq!(second.name, "Lake View");
        assert!(second.fake && second.not_launched);

        let ids: Vec<_> = data.developers.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert_eq!(data.developers[0].name, "Acme Dev");
    }

    #[test]
    fn test_empty_csv_is_an_error() {
        assert!(matches!(parse_projects_csv("  \n"), Err(AppError::Remote(_))));
    }

    #[test]
    fn test_projects_by_developers() {
        let data = parse_projects_csv(CSV).unwrap();
        assert!(projects_by_developers(&data.projects, &[]).is_empty());
        let picked = projects_by_developers(&data.projects, &["d1".to_string()]);
        let ids: Vec<_> = picked.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[test]
    fn test_project_labels() {
        let data = parse_projects_csv(CSV).unwrap();
        assert_eq!(project_label(&data.projects, "p2"), "Lake View");
        assert_eq!(project_label(&data.projects, "zz"), "zz");
        let labels = project_labels(&data.projects, &["p1".into(), "p9".into()]);
        assert_eq!(labels["p1"], "Palm Hills");
        assert_eq!(labels["p9"], "p9");
    }
}
