//! Static artifact templates.
//!
//! Boilerplate files in the target project (the project manifest, the
//! entry point, layout scaffolding, app settings) have a fixed shape
//! that does not benefit from generation. They are resolved by the base
//! name of the target path, or by artifact kind for the project
//! manifest whose base name varies with the project name.
//!
//! Templates carry `{namespace}` and `{connection_string}` placeholders
//! that [`render`] substitutes.

use crate::models::{ArtifactKind, TargetFileSpec};

const CSPROJ: &str = r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <PropertyGroup>
    <TargetFramework>net9.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Microsoft.AspNetCore.Mvc" Version="9.0.0" />
    <PackageReference Include="Microsoft.EntityFrameworkCore" Version="9.0.0" />
  </ItemGroup>
</Project>"#;

const PROGRAM_CS: &str = r#"using Microsoft.AspNetCore.Hosting;
using Microsoft.Extensions.Hosting;

public class Program
{
    public static void Main(string[] args)
    {
        CreateHostBuilder(args).Build().Run();
    }

    public static IHostBuilder CreateHostBuilder(string[] args) =>
        Host.CreateDefaultBuilder(args)
            .ConfigureWebHostDefaults(webBuilder =>
            {
                webBuilder.UseStartup<Startup>();
            });
}"#;

const VIEW_IMPORTS: &str = r#"@using {namespace}.Presentation
@using {namespace}.Domain.Entities
@addTagHelper *, Microsoft.AspNetCore.Mvc.TagHelpers"#;

const VIEW_START: &str = r#"@{
    Layout = "_Layout";
}"#;

const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>@ViewData["Title"] - {namespace}</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css" />
    <link rel="stylesheet" href="~/css/site.css" asp-append-version="true" />
</head>
<body>
    <header>
        <nav class="navbar navbar-expand-sm navbar-toggleable-sm navbar-light bg-white border-bottom box-shadow mb-3">
            <div class="container-fluid">
                <a class="navbar-brand" asp-area="" asp-controller="Home" asp-action="Index">{namespace}</a>
            </div>
        </nav>
    </header>
    <div class="container">
        <main role="main" class="pb-3">
            @RenderBody()
        </main>
    </div>
    <script src="https://cdn.jsdelivr.net/npm/jquery@3.6.0/dist/jquery.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js"></script>
    <script src="~/js/site.js" asp-append-version="true"></script>
    @await RenderSectionAsync("Scripts", required: false)
</body>
</html>"#;

const VALIDATION_SCRIPTS_PARTIAL: &str = r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/jquery-validate/1.19.3/jquery.validate.min.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/jquery-validation-unobtrusive/3.2.12/jquery.validate.unobtrusive.min.js"></script>"#;

const APP_SETTINGS: &str = r#"{
    "ConnectionStrings": {
        "DefaultConnection": "{connection_string}"
    },
    "Logging": { "LogLevel": { "Default": "Information", "Microsoft.AspNetCore": "Warning" } },
    "AllowedHosts": "*"
}"#;

/// Placeholder written into `appsettings.json` when no connection string
/// is configured.
pub const PLACEHOLDER_CONNECTION_STRING: &str =
    "Server=YOUR_SERVER_ADDRESS;Database=YOUR_DATABASE_NAME;User=YOUR_USERNAME;Password=YOUR_PASSWORD;";

/// Find the static template for a target file, if one applies.
///
/// Resolution is by the base name of the target path, with two
/// kind-based fallbacks: any `Project` artifact gets the project
/// manifest, and any `Config` artifact gets the app settings template.
pub fn lookup(spec: &TargetFileSpec) -> Option<&'static str> {
    let base_name = spec
        .file_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(spec.file_path.as_str());

    match base_name {
        "Program.cs" => return Some(PROGRAM_CS),
        "appsettings.json" => return Some(APP_SETTINGS),
        "_ViewImports.cshtml" => return Some(VIEW_IMPORTS),
        "_ViewStart.cshtml" => return Some(VIEW_START),
        "_Layout.cshtml" => return Some(LAYOUT),
        "_ValidationScriptsPartial.cshtml" => return Some(VALIDATION_SCRIPTS_PARTIAL),
        _ => {}
    }

    if base_name.ends_with(".csproj") {
        return Some(CSPROJ);
    }

    match spec.kind {
        ArtifactKind::Project => Some(CSPROJ),
        ArtifactKind::Config => Some(APP_SETTINGS),
        _ => None,
    }
}

/// Substitute the namespace and connection-string placeholders.
pub fn render(template: &str, namespace: &str, connection_string: Option<&str>) -> String {
    let conn = connection_string.unwrap_or(PLACEHOLDER_CONNECTION_STRING);
    template
        .replace("{namespace}", namespace)
        .replace("{connection_string}", conn)
}
