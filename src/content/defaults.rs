//! Seed content every store starts from.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::Section;

/// Default value of one section. `now` stamps the maintenance record.
pub fn section(section: Section, now: DateTime<Utc>) -> Value {
    match section {
        Section::Hero => json!({
            "name": "Developer",
            "title": "Full Stack Developer",
            "subtitle": "Cloud & DevOps Engineer",
            "description": "Building scalable services and modern web applications.",
            "primaryButtonText": "Get In Touch",
            "secondaryButtonText": "Download CV",
            "cvFileName": "resume.pdf",
            "backgroundImage": "",
            "socialLinks": [
                { "platform": "GitHub", "url": "https://github.com/developer", "icon": "github" },
                { "platform": "LinkedIn", "url": "https://linkedin.com/in/developer", "icon": "linkedin" }
            ]
        }),
        Section::About => json!({
            "title": "About Me",
            "paragraph1": "I'm a full-stack developer working across web technologies and cloud infrastructure.",
            "paragraph2": "I enjoy building efficient, maintainable systems.",
            "profileImage": "/profile.jpg",
            "stats": {
                "experience": { "value": "3+", "label": "Years Experience" },
                "projects": { "value": "25+", "label": "Projects Completed" },
                "technologies": { "value": "15+", "label": "Technologies" }
            },
            "skills": [
                { "name": "React/TypeScript", "level": 90, "category": "frontend" },
                { "name": "Rust", "level": 80, "category": "backend" },
                { "name": "AWS/Cloud", "level": 80, "category": "cloud" },
                { "name": "Docker/K8s", "level": 75, "category": "devops" }
            ]
        }),
        Section::Skills => json!({
            "title": "Skills & Technologies",
            "categories": [
                {
                    "name": "Frontend Development",
                    "icon": "code",
                    "skills": ["React", "TypeScript", "HTML5/CSS3", "Tailwind CSS"]
                },
                {
                    "name": "Backend Development",
                    "icon": "server",
                    "skills": ["Rust", "Node.js", "PostgreSQL", "REST APIs"]
                },
                {
                    "name": "Cloud & DevOps",
                    "icon": "cloud",
                    "skills": ["AWS", "Docker", "Kubernetes", "CI/CD"]
                }
            ]
        }),
        Section::Projects => json!([
            {
                "id": "1",
                "title": "Portfolio Website",
                "description": "Personal portfolio with a content API and admin panel.",
                "tech": ["React", "TypeScript", "Rust", "Axum"],
                "link": "https://github.com/developer/portfolio",
                "featured": true,
                "category": "Full Stack",
                "status": "completed"
            }
        ]),
        Section::Blog => json!({
            "title": "Latest Blog Posts",
            "posts": [
                {
                    "id": "1",
                    "title": "Building Scalable React Applications",
                    "excerpt": "Practices for large React codebases with TypeScript.",
                    "content": "Full blog post content here...",
                    "author": "Developer",
                    "publishDate": "2024-07-15",
                    "readTime": "5 min read",
                    "tags": ["React", "TypeScript"],
                    "published": true
                }
            ]
        }),
        Section::Contact => json!({
            "title": "Get In Touch",
            "subtitle": "Let's work together on your next project",
            "email": "dev@example.com",
            "phone": "",
            "location": "Remote",
            "socialLinks": [
                { "platform": "Email", "url": "mailto:dev@example.com", "icon": "email" },
                { "platform": "GitHub", "url": "https://github.com/developer", "icon": "github" }
            ],
            "contactForm": {
                "enabled": true,
                "fields": ["name", "email", "subject", "message"],
                "emailNotifications": false
            }
        }),
        Section::Config => json!({
            "siteName": "Developer Portfolio",
            "siteDescription": "Full Stack Developer & Cloud Engineer Portfolio",
            "siteUrl": "http://localhost:3000",
            "theme": "dark",
            "primaryColor": "#3b82f6",
            "secondaryColor": "#8b5cf6",
            "analytics": { "googleAnalytics": "", "enabled": false },
            "seo": {
                "keywords": ["Full Stack Developer", "Rust", "React"],
                "ogImage": "/og-image.jpg"
            }
        }),
        Section::Maintenance => json!({
            "isGloballyActive": false,
            "message": "We're currently updating the site to serve you better!",
            "estimatedTime": "We'll be back online shortly",
            "lastUpdated": now
        }),
    }
}

/// Every section with its default value, in `Section::ALL` order.
pub fn all(now: DateTime<Utc>) -> Vec<(Section, Value)> {
    Section::ALL
        .into_iter()
        .map(|s| (s, section(s, now)))
        .collect()
}
