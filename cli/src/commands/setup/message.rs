use console::style;

/// Summary printed at the end of the deploy step
pub(crate) struct StatusMessage<'a> {
    pub(crate) cli_name: &'a str,
    pub(crate) service_name: &'a str,
    pub(crate) has_been_deployed: bool,
    pub(crate) is_configured_with_dashboard: bool,

    /// Interact view of the deployed instance, only known after a deployment
    pub(crate) dashboard_url: Option<String>,
}

impl StatusMessage<'_> {
    pub(crate) fn render(&self) -> String {
        let run = |command: &str| style(format!("{} {command}", self.cli_name)).bold();
        let location = style(format!("./{}", self.service_name)).white().bold();

        let mut lines = vec![if self.has_been_deployed {
            format!(
                "\n{}{location}",
                style("Your project is live and available in ").green()
            )
        } else {
            format!(
                "\n{}{location}",
                style("Your project is ready for deployment and available in ").green()
            )
        }];

        match (self.is_configured_with_dashboard, self.has_been_deployed) {
            (true, true) => {
                lines.push(format!("\n  Run {} in the project directory", run("info")));
                lines.push("    View your endpoints and services".into());

                lines.push(match &self.dashboard_url {
                    Some(url) => format!("\n  Open {}", style(url).bold()),
                    None => "\n  Open Serverless Dashboard".into(),
                });

                lines.push("    Invoke your functions and view logs in the dashboard".into());
                lines.push(format!("\n  Run {} in the project directory", run("deploy")));
                lines.push(
                    "    Redeploy your service after you've updated your service code or configuration\n\n"
                        .into(),
                );
            }

            (true, false) => {
                lines.push(format!("\n  Run {} in the project directory", run("deploy")));
                lines.push("    Deploy your newly created service".into());

                lines.push(format!(
                    "\n  Run {} in the project directory after deployment",
                    run("info")
                ));

                lines.push("    View your endpoints and services".into());
                lines.push("\n  Open Serverless Dashboard after deployment".into());
                lines.push("    Invoke your functions and view logs in the dashboard\n\n".into());
            }

            (false, true) => {
                lines.push(format!("\n  Run {} in the project directory", run("info")));
                lines.push("    View your endpoints and services".into());
                lines.push(format!("\n  Run {} in the directory", run("deploy")));
                lines.push(
                    "    Redeploy your service after you've updated your service code or configuration"
                        .into(),
                );

                lines.push(format!(
                    "\n  Run {} and {} in the project directory",
                    run("invoke"),
                    run("logs")
                ));

                lines.push("    Invoke your functions directly and view the logs".into());
                lines.extend(self.dashboard_hint());
            }

            (false, false) => {
                lines.push(format!("\n  Run {} in the project directory", run("deploy")));
                lines.push("    Deploy your newly created service".into());

                lines.push(format!(
                    "\n  Run {} in the project directory after deployment",
                    run("info")
                ));

                lines.push("    View your endpoints and services".into());

                lines.push(format!(
                    "\n  Run {} and {} in the project directory after deployment",
                    run("invoke"),
                    run("logs")
                ));

                lines.push("    Invoke your functions directly and view the logs".into());
                lines.extend(self.dashboard_hint());
            }
        }

        lines.join("\n")
    }

    /// Suggest enabling the dashboard for projects without an org
    fn dashboard_hint(&self) -> [String; 2] {
        [
            format!(
                "\n  Run {} in the project directory",
                style(self.cli_name).bold()
            ),
            "    Add metrics, alerts, and a log explorer, by enabling the dashboard functionality\n\n"
                .into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(
        has_been_deployed: bool,
        is_configured_with_dashboard: bool,
        dashboard_url: Option<&str>,
    ) -> String {
        let message = StatusMessage {
            cli_name: "serverless",
            service_name: "api",
            has_been_deployed,
            is_configured_with_dashboard,
            dashboard_url: dashboard_url.map(String::from),
        };

        console::strip_ansi_codes(&message.render()).to_string()
    }

    #[test]
    fn deployed_with_dashboard() {
        assert_eq!(
            render(true, true, Some("https://app.serverless.com/acme/apps/api/api/dev/us-east-1/interact")),
            [
                "\nYour project is live and available in ./api",
                "\n  Run serverless info in the project directory",
                "    View your endpoints and services",
                "\n  Open https://app.serverless.com/acme/apps/api/api/dev/us-east-1/interact",
                "    Invoke your functions and view logs in the dashboard",
                "\n  Run serverless deploy in the project directory",
                "    Redeploy your service after you've updated your service code or configuration\n\n",
            ]
            .join("\n")
        );
    }

    #[test]
    fn declined_with_dashboard() {
        assert_eq!(
            render(false, true, None),
            [
                "\nYour project is ready for deployment and available in ./api",
                "\n  Run serverless deploy in the project directory",
                "    Deploy your newly created service",
                "\n  Run serverless info in the project directory after deployment",
                "    View your endpoints and services",
                "\n  Open Serverless Dashboard after deployment",
                "    Invoke your functions and view logs in the dashboard\n\n",
            ]
            .join("\n")
        );
    }

    #[test]
    fn deployed_without_dashboard() {
        assert_eq!(
            render(true, false, None),
            [
                "\nYour project is live and available in ./api",
                "\n  Run serverless info in the project directory",
                "    View your endpoints and services",
                "\n  Run serverless deploy in the directory",
                "    Redeploy your service after you've updated your service code or configuration",
                "\n  Run serverless invoke and serverless logs in the project directory",
                "    Invoke your functions directly and view the logs",
                "\n  Run serverless in the project directory",
                "    Add metrics, alerts, and a log explorer, by enabling the dashboard functionality\n\n",
            ]
            .join("\n")
        );
    }

    #[test]
    fn declined_without_dashboard() {
        assert_eq!(
            render(false, false, None),
            [
                "\nYour project is ready for deployment and available in ./api",
                "\n  Run serverless deploy in the project directory",
                "    Deploy your newly created service",
                "\n  Run serverless info in the project directory after deployment",
                "    View your endpoints and services",
                "\n  Run serverless invoke and serverless logs in the project directory after deployment",
                "    Invoke your functions directly and view the logs",
                "\n  Run serverless in the project directory",
                "    Add metrics, alerts, and a log explorer, by enabling the dashboard functionality\n\n",
            ]
            .join("\n")
        );
    }

    #[test]
    fn deployed_with_dashboard_but_no_link() {
        assert!(render(true, true, None).contains("\n  Open Serverless Dashboard\n"));
    }

    #[test]
    fn rendering_is_pure() {
        assert_eq!(render(true, true, Some("u")), render(true, true, Some("u")));
        assert_eq!(render(false, false, None), render(false, false, None));
    }
}
