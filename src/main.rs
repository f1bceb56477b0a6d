use std::env;
use std::process;

use log::{error, info};
use osbench::{AuthContext, Operation, Runner, TestCase};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(password) = env::args().nth(1) else {
        eprintln!("usage: osbench <password>");
        process::exit(1);
    };

    let auth = AuthContext {
        auth_url: "https://openstack.local/v3".to_string(),
        username: "admin".to_string(),
        password,
        project_name: "admin".to_string(),
        project_domain_name: "default".to_string(),
        user_domain_name: "default".to_string(),
    };

    let mut nova_list = TestCase::new("nova_list", "compute", Operation::Get, "/servers");
    nova_list.concurrency = Some(1);
    nova_list.repeat = Some(30_000);

    let mut glance_image_list =
        TestCase::new("glance_image_list", "image", Operation::Get, "/v2/images");
    glance_image_list.concurrency = Some(1);
    glance_image_list.repeat = Some(100);

    let testcases = [nova_list, glance_image_list];

    let mut runner = Runner::new();
    info!("starting test case execution");
    if let Err(err) = runner.execute(auth, &testcases) {
        error!("run aborted: {err}");
        process::exit(1);
    }
}
